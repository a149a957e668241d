// Handlers behind jwt_auth_middleware. Every handler receives the AuthUser
// extension inserted by the middleware.
pub mod auth;
pub mod submissions;
