//! Route handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/chat` | Body: `{"message": "..."}`; never fails once a message is given |
//! | `POST` | `/api/kb/add` | Admin key; body: `{"id"?, "questionTemplates"?, "answerText"}` |
//! | `POST` | `/api/kb/import` | Admin key; body: array of `{"id"?, "templates"?, "answer"?}` |
//! | `GET`  | `/api/answers` | Every entry with up to 3 sample templates |

pub mod answers;
pub mod chat;
pub mod kb;
