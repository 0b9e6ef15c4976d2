// Models module - contains Form, Question tree, FormResponse, Role, User

pub mod document;
pub mod form;
pub mod localized;
pub mod question;
pub mod response;
pub mod role;
pub mod saved_question;
pub mod user;

pub use document::DocumentMeta;
pub use form::{Audience, Form, FormSettings, FormStatus, Schedule};
pub use localized::LocalizedText;
pub use question::{ChoiceOption, Question, QuestionKind, QuestionNode, walk_questions};
pub use response::{Answer, AnswerValue, FormResponse};
pub use role::Role;
pub use saved_question::SavedQuestion;
pub use user::{User, UserProfile};
