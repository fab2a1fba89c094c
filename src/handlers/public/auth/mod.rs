// handlers/public/auth - token acquisition, no authentication required

pub mod login;
pub mod signup;

pub use login::login_post;
pub use signup::signup_post;
