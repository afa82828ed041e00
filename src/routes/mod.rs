/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// so access control is applied explicitly at the module level (via Axum
/// layers) instead of per-handler, preventing accidental exposure of
/// protected endpoints.
///
/// The three modules map directly to the defined access tiers.

/// Routes accessible to all clients (anonymous, read-only plus the contact
/// and upload gateways).
pub mod public;

/// Routes protected by the bearer-token middleware. Requires a validated
/// admin session of any role.
pub mod authenticated;

/// Routes restricted to the admin-management surface. Handlers additionally
/// enforce the super_admin policy checks.
pub mod admin;
