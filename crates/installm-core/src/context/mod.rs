mod history;
pub mod template;

pub use history::{ConversationHistory, Role, Turn};
pub use template::{clean_output, PromptTemplate};
