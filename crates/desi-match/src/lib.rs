//! Matching engine for the Desi Food support bot.
//!
//! Turns a raw customer utterance into a reply by combining a hand-ordered
//! intent cascade with a statistical best-match ranker over the knowledge
//! base. Pure synchronous; no HTTP or storage dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use desi_core::KbEntry;
//! use desi_match::{KbSnapshot, dialogue};
//!
//! let kb = KbSnapshot::build(vec![KbEntry::new(
//!   "payment_methods",
//!   vec!["what payment methods do you accept".into()],
//!   "We accept UPI, cards and cash on delivery.",
//! )]);
//! let today = chrono::Local::now().date_naive();
//! let reply = dialogue::route(&kb, "how can i pay", today, &mut rand::rng());
//! println!("{}", reply.reply);
//! ```

pub mod dialogue;
pub mod index;
pub mod intent;
pub mod normalize;
pub mod rank;
pub mod score;
pub mod snapshot;
pub mod tokenize;

pub use dialogue::{Branch, Reply, route};
pub use intent::{Intent, OrderIntent, detect_intent, detect_order_intent};
pub use normalize::normalize;
pub use rank::{BestMatch, ComponentScores, find_best_match};
pub use snapshot::KbSnapshot;
pub use tokenize::tokenize;
