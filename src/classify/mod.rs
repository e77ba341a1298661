mod needs_redirect;

pub use needs_redirect::*;
