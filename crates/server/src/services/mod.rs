//! Services: authentication, the checkout orchestrator, and clients for the
//! external collaborators (EasyPost, Stripe, SMTP).

pub mod auth;
pub mod checkout;
pub mod easypost;
pub mod email;
pub mod stripe;

pub use auth::AuthService;
pub use checkout::CheckoutService;
pub use easypost::EasyPostClient;
pub use email::EmailService;
pub use stripe::StripeClient;
