//! Demo organizations, users and submissions for local development.
//!
//! Seeding is idempotent: existing organizations and users (matched by name
//! and email) are reused and existing tags are left alone.

use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use super::models::{NewSubmission, NewUser, Organization, SubmissionData, User};
use super::store::{StoreResult, SubmissionStore};
use crate::types::{RiskLevel, Role};

pub const DEMO_ORGANIZATIONS: &[&str] = &["Company1", "Company2", "Company3"];

/// (name, email, role, organization)
pub const DEMO_USERS: &[(&str, &str, Role, &str)] = &[
    ("Admin User", "admin@example.com", Role::Admin, "Company1"),
    ("Director One", "director1@company1.com", Role::Director, "Company1"),
    ("Director Two", "director2@company2.com", Role::Director, "Company2"),
    ("Analyst One", "analyst1@company1.com", Role::Analyst, "Company1"),
    ("Analyst Two", "analyst2@company1.com", Role::Analyst, "Company1"),
    ("Analyst Three", "analyst3@company2.com", Role::Analyst, "Company2"),
    ("Director Three", "director3@company3.com", Role::Director, "Company3"),
    ("Analyst Four", "analyst4@company3.com", Role::Analyst, "Company3"),
    ("Analyst Five", "analyst5@company3.com", Role::Analyst, "Company3"),
];

/// (author email, tag, risk, sensitive_info)
const DEMO_SUBMISSIONS: &[(&str, &str, RiskLevel, Option<&str>)] = &[
    (
        "director1@company1.com",
        "SUB-001",
        RiskLevel::High,
        Some("Internal investigation notes: Possible compliance issue detected during Q3 audit."),
    ),
    (
        "director2@company2.com",
        "SUB-001",
        RiskLevel::Medium,
        Some("Director review: Authorized for public disclosure pending final approval."),
    ),
    (
        "director3@company3.com",
        "SUB-001",
        RiskLevel::Low,
        Some("Director assessment: Cross-organizational review completed successfully."),
    ),
    ("analyst1@company1.com", "SUB-002", RiskLevel::Medium, None),
    ("analyst1@company1.com", "SUB-003", RiskLevel::High, None),
    ("analyst3@company2.com", "SUB-003", RiskLevel::High, None),
    ("analyst2@company1.com", "SUB-004", RiskLevel::High, None),
    ("analyst3@company2.com", "SUB-004", RiskLevel::Medium, None),
    ("analyst4@company3.com", "SUB-004", RiskLevel::Low, None),
    (
        "director1@company1.com",
        "SUB-005",
        RiskLevel::None,
        Some("Director comment: All clear, approved for standard processing."),
    ),
    (
        "director3@company3.com",
        "SUB-005",
        RiskLevel::Low,
        Some("Director review: Similar case to Company1, approved for processing."),
    ),
];

#[derive(Debug, Default)]
pub struct SeedReport {
    pub organizations: HashMap<String, Organization>,
    pub users: HashMap<String, User>,
    pub submissions_created: usize,
}

impl SeedReport {
    pub fn user(&self, email: &str) -> Option<&User> {
        self.users.get(email)
    }

    pub fn organization(&self, name: &str) -> Option<&Organization> {
        self.organizations.get(name)
    }
}

pub async fn seed_demo_data(store: &dyn SubmissionStore) -> StoreResult<SeedReport> {
    let mut report = SeedReport::default();

    for name in DEMO_ORGANIZATIONS {
        let organization = match store.find_organization_by_name(name).await? {
            Some(existing) => existing,
            None => store.create_organization(name).await?,
        };
        report.organizations.insert(name.to_string(), organization);
    }

    for (name, email, role, org_name) in DEMO_USERS {
        let organization_id = org_id(&report, org_name)?;
        let user = match store.find_user_by_email(email).await? {
            Some(existing) => existing,
            None => {
                store
                    .create_user(NewUser {
                        name: name.to_string(),
                        email: email.to_string(),
                        credential_hash: None,
                        role: *role,
                        organization_id,
                    })
                    .await?
            }
        };
        report.users.insert(email.to_string(), user);
    }

    for (email, tag, risk, sensitive_info) in DEMO_SUBMISSIONS {
        let Some(author) = report.users.get(*email) else {
            continue;
        };
        if store
            .find_submission_by_tag(author.organization_id, tag)
            .await?
            .is_some()
        {
            continue;
        }
        store
            .create_submission(NewSubmission {
                user_id: author.id,
                organization_id: author.organization_id,
                tag_name: tag.to_string(),
                risk: *risk,
                data: SubmissionData::with_sensitive_info(*sensitive_info),
            })
            .await?;
        report.submissions_created += 1;
    }

    info!(
        "Seeded {} organizations, {} users, {} new submissions",
        report.organizations.len(),
        report.users.len(),
        report.submissions_created
    );
    Ok(report)
}

fn org_id(report: &SeedReport, name: &str) -> StoreResult<Uuid> {
    report
        .organizations
        .get(name)
        .map(|o| o.id)
        .ok_or_else(|| super::store::StoreError::NotFound(format!("organization '{}'", name)))
}
