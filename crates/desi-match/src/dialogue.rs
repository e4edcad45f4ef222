//! Dialogue router: the per-message priority cascade.
//!
//! Order, first applicable branch wins:
//!
//! 1. negation ("I don't want …")
//! 2. order tracking, with or without an order id
//! 3. price questions
//! 4. quantity questions
//! 5. "if I order today, when does it arrive"
//! 6. brand comparisons
//! 7. several questions in one message
//! 8. deterministic intent → KB entry
//! 9. statistical best match above the threshold
//! 10. a randomly chosen "I don't know" reply
//!
//! No branch mutates the KB.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use rand::Rng;
use regex::Regex;
use serde::Serialize;

use crate::{
  intent::{Intent, detect_intent, detect_order_intent},
  normalize::normalize,
  rank::ComponentScores,
  snapshot::KbSnapshot,
};

/// Minimum combined score for a ranked match to be answered.
pub const DEFAULT_THRESHOLD: f64 = 0.44;

const MIN_DELIVERY_DAYS: u64 = 7;
const MAX_DELIVERY_DAYS: u64 = 14;

pub const NEGATION_REPLY: &str = "No problem! Let me know if you need help with anything else. I can assist with shipping, payments, returns, or product recommendations.";
pub const ORDER_ID_PROMPT: &str =
  "Please provide your order id (e.g., ORD123) so I can check tracking.";
pub const QUANTITY_REPLY: &str = "You can order any quantity from 100g to 50kg per item. For bulk orders above 50kg, contact wholesale@desifood.com for special pricing.";
pub const BRAND_COMPARISON_REPLY: &str = "Both brands are excellent! The choice depends on your preference:\n• Amul/India Gate/Aashirvaad - Most popular, widely available, consistent quality\n• Nandini/Daawat/Pillsbury - Great quality, slightly different taste profile\n\nBoth are trusted brands. Try both and see which you prefer!";
pub const MULTI_QUESTION_REPLY: &str = "I see you have multiple questions! Let me help you one at a time for better answers. Please ask your first question, then I'll answer the next one. 😊";

pub const FALLBACK_REPLIES: &[&str] = &[
  "I'm not sure about that yet. Try asking: 'What payment methods?', 'Best ghee brand?', 'Shipping time?', or 'Return policy?'",
  "Hmm, I don't have that info right now. You can ask me about products, shipping, payments, or returns!",
  "I'm still learning! Ask me about: payment methods, product brands, shipping details, or order tracking.",
  "Sorry, I couldn't find an answer. Try: 'Which brand is good for rice?', 'Do I need to pay custom duty?', or 'How to contact support?'",
];

// ─── Reply ───────────────────────────────────────────────────────────────────

/// Which cascade branch produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
  Negation,
  Order,
  Price,
  Quantity,
  DeliveryDate,
  BrandComparison,
  MultiQuestion,
  Intent(Intent),
  Ranked,
  Fallback,
}

/// Score breakdown attached to ranked replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDebug {
  /// Combined score rounded to three decimals.
  pub score:            f64,
  pub components:       ComponentScores,
  pub matched_template: String,
}

/// One chat reply payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
  pub reply:   String,
  /// Id of the KB entry answered through the intent table.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub matched: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub debug:   Option<MatchDebug>,
  #[serde(skip)]
  pub branch:  Branch,
}

impl Reply {
  fn text(branch: Branch, reply: impl Into<String>) -> Self {
    Self {
      reply: reply.into(),
      matched: None,
      debug: None,
      branch,
    }
  }
}

// ─── Heuristic patterns ──────────────────────────────────────────────────────

struct Patterns {
  negation:      Regex,
  desire:        Regex,
  price:         Regex,
  product:       Regex,
  quantity:      Regex,
  purchase:      Regex,
  arrival:       Regex,
  soon:          Regex,
  comparison:    Regex,
  brand:         Regex,
  conjunction_q: Regex,
}

fn pattern(p: &str) -> Regex {
  Regex::new(p).expect("dialogue pattern is valid")
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
  negation:      pattern(r"\b(don't|dont|not|no|never)\b"),
  desire:        pattern(r"want|need|interested|like"),
  price:         pattern(r"price|cost|how much|expensive|cheap"),
  product:       pattern(r"ghee|rice|atta|dal|oil|spice|tea|product"),
  quantity:      pattern(r"how much|how many|quantity|kg|kilogram|gram|liter"),
  purchase:      pattern(r"order|buy|purchase"),
  arrival:       pattern(r"when.*arrive|delivery date|get.*order|receive.*order"),
  soon:          pattern(r"today|tomorrow|order today"),
  comparison:    pattern(r"better|compare|difference|vs|versus"),
  brand:         pattern(r"amul|nandini|india gate|daawat|aashirvaad|pillsbury"),
  conjunction_q: pattern(r"\band\b.*\?|\balso\b.*\?"),
});

// ─── Router ──────────────────────────────────────────────────────────────────

/// Cascade settings.
#[derive(Debug, Clone, Copy)]
pub struct Dialogue {
  pub threshold: f64,
}

impl Default for Dialogue {
  fn default() -> Self {
    Self {
      threshold: DEFAULT_THRESHOLD,
    }
  }
}

impl Dialogue {
  pub fn new(threshold: f64) -> Self {
    Self { threshold }
  }

  /// Produce the reply for one message.
  ///
  /// `today` anchors the delivery-window branch and `rng` picks the
  /// fallback text; both are injected so callers (and tests) control them.
  pub fn route<R: Rng + ?Sized>(
    &self,
    kb: &KbSnapshot,
    message: &str,
    today: NaiveDate,
    rng: &mut R,
  ) -> Reply {
    let reply = self.cascade(kb, message, today, rng);
    tracing::debug!(branch = ?reply.branch, matched = ?reply.matched, "chat reply");
    reply
  }

  fn cascade<R: Rng + ?Sized>(
    &self,
    kb: &KbSnapshot,
    message: &str,
    today: NaiveDate,
    rng: &mut R,
  ) -> Reply {
    let p = &*PATTERNS;
    let q = normalize(message);

    if p.negation.is_match(&q) && p.desire.is_match(&q) {
      return Reply::text(Branch::Negation, NEGATION_REPLY);
    }

    if let Some(order) = detect_order_intent(message) {
      return match order.order_id {
        Some(id) => Reply::text(
          Branch::Order,
          format!("Order {id} is currently: Demo status (replace with real lookup)."),
        ),
        None => Reply::text(Branch::Order, ORDER_ID_PROMPT),
      };
    }

    if p.price.is_match(&q) && p.product.is_match(&q) {
      let product = ["ghee", "rice", "atta"]
        .into_iter()
        .find(|name| q.contains(name))
        .unwrap_or("products");
      return Reply::text(Branch::Price, price_reply(product));
    }

    if p.quantity.is_match(&q) && p.purchase.is_match(&q) {
      return Reply::text(Branch::Quantity, QUANTITY_REPLY);
    }

    if p.arrival.is_match(&q) && p.soon.is_match(&q) {
      return Reply::text(Branch::DeliveryDate, delivery_reply(today));
    }

    if p.comparison.is_match(&q) && p.brand.is_match(&q) {
      return Reply::text(Branch::BrandComparison, BRAND_COMPARISON_REPLY);
    }

    if is_multi_question(message) {
      return Reply::text(Branch::MultiQuestion, MULTI_QUESTION_REPLY);
    }

    if let Some(intent) = detect_intent(message)
      && let Some(entry) = kb.get(intent.kb_id())
    {
      return Reply {
        reply:   entry.answer.clone(),
        matched: Some(entry.id.clone()),
        debug:   None,
        branch:  Branch::Intent(intent),
      };
    }

    if let Some(best) = kb.best_match(message)
      && best.combined >= self.threshold
      && let Some(entry) = kb.get(&best.owner_id)
    {
      return Reply {
        reply:   entry.answer.clone(),
        matched: None,
        debug:   Some(MatchDebug {
          score:            round3(best.combined),
          components:       best.components,
          matched_template: best.doc_text,
        }),
        branch:  Branch::Ranked,
      };
    }

    let pick = rng.random_range(0..FALLBACK_REPLIES.len());
    Reply::text(Branch::Fallback, FALLBACK_REPLIES[pick])
  }
}

/// [`Dialogue::route`] with the default threshold.
pub fn route<R: Rng + ?Sized>(
  kb: &KbSnapshot,
  message: &str,
  today: NaiveDate,
  rng: &mut R,
) -> Reply {
  Dialogue::default().route(kb, message, today, rng)
}

fn price_reply(product: &str) -> String {
  format!(
    "Prices vary by brand and quantity. Please visit our website or app to see current prices for {product}. We offer competitive pricing and regular discounts!"
  )
}

/// Delivery window of `[today + 7, today + 14]` days as short month/day.
fn delivery_reply(today: NaiveDate) -> String {
  let earliest = today + Days::new(MIN_DELIVERY_DAYS);
  let latest = today + Days::new(MAX_DELIVERY_DAYS);
  format!(
    "If you order today, your package should arrive between {} and {} (7-14 business days). Express shipping available for 3-5 days delivery!",
    earliest.format("%b %-d"),
    latest.format("%b %-d"),
  )
}

/// A conjunction followed later by `?`, or more than one `?`. Runs on the
/// raw text because normalisation strips question marks.
fn is_multi_question(message: &str) -> bool {
  let lowered = message.to_lowercase();
  PATTERNS.conjunction_q.is_match(&lowered) || message.matches('?').count() > 1
}

fn round3(x: f64) -> f64 {
  (x * 1000.0).round() / 1000.0
}
