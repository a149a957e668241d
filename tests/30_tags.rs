mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn tag_detail_groups_organizations() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.token_for("analyst3@company2.com")?;

    let res = app.get("/api/submissions/tags/SUB-003", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["submission_count"], 2);
    assert_eq!(res.data()["has_risk_mismatch"], false);

    let res = app.get("/api/submissions/tags/SUB-001", &token).await?;
    assert_eq!(res.data()["has_risk_mismatch"], true);
    // Directors' notes stay hidden from an analyst who wrote none of them.
    let body = res.body.to_string();
    assert!(!body.contains("Internal investigation notes"));
    Ok(())
}

#[tokio::test]
async fn unknown_tag_is_not_found() -> Result<()> {
    let app = common::spawn_app().await?;
    let res = app.get("/api/submissions/tags/NOPE-999", &app.token_for("admin@example.com")?).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.code(), Some("NOT_FOUND"));
    Ok(())
}

#[tokio::test]
async fn mismatches_report_disagreeing_tags() -> Result<()> {
    let app = common::spawn_app().await?;
    let token = app.token_for("director1@company1.com")?;

    let res = app.get("/api/submissions/mismatches", &token).await?;
    assert_eq!(res.status, StatusCode::OK);
    let tags: Vec<&str> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["tag_name"].as_str())
        .collect();
    assert_eq!(tags, vec!["SUB-001", "SUB-004", "SUB-005"]);

    assert_eq!(
        res.data()[2],
        json!({
            "tag_name": "SUB-005",
            "risk_levels": ["NONE", "LOW"],
            "submission_count": 2,
            "organizations": ["Company1", "Company3"]
        })
    );
    Ok(())
}

#[tokio::test]
async fn aligning_risk_clears_the_mismatch() -> Result<()> {
    let app = common::spawn_app().await?;
    let admin = app.token_for("admin@example.com")?;

    let res = app.get("/api/submissions?tag=SUB-005", &admin).await?;
    let ids: Vec<String> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["id"].as_str().map(str::to_string))
        .collect();
    for id in ids {
        let res = app.put(&format!("/api/submissions/{}", id), &admin, json!({"risk": "LOW"})).await?;
        assert_eq!(res.status, StatusCode::OK);
    }

    let res = app.get("/api/submissions/mismatches", &admin).await?;
    assert!(res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .all(|m| m["tag_name"] != "SUB-005"));
    Ok(())
}
