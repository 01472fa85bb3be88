// Handler tiers:
// Public (no auth) → Protected (session token) → Elevated (admin or super_user role)
pub mod elevated;
pub mod protected;
pub mod public;
