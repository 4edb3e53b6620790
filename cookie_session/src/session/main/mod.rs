mod cookie;
mod handle;

pub use cookie::{CookieChange, CookieDefinition, CookieRegistry, ResponseCookies, SameSite};
pub use handle::SessionHandle;

pub(crate) use cookie::{is_valid_cookie_name, is_valid_cookie_value};
