pub mod admin_helpers;
pub mod form_helpers;
pub mod generation_helpers;
pub mod prompt_builder;
pub mod text_helpers;
pub mod time_helpers;
