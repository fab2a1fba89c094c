// handlers - public (no auth) and protected (bearer token) tiers

pub mod protected;
pub mod public;
