// Administration endpoints. Every handler requires the admin or super_user role.
pub mod users;
