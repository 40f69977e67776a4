pub mod parameter;
pub mod request;
pub mod response;

pub use parameter::{Coercion, ParameterValidator, ParametersValidator};
pub use request::RequestBodyValidator;
pub use response::{DocumentedResponse, ResponseValidator};
