//! Rule-based intent classifier and order-id extraction.
//!
//! The cascade is a declarative, ordered table. Each rule is a conjunction
//! of patterns over the normalised message; the first rule whose patterns
//! all match wins. Specific rules sit above generic ones so that e.g.
//! "delivery fee" resolves to [`Intent::ShippingCost`] before the catch-all
//! `ship|delivery` rule can claim it.

use std::{fmt, sync::LazyLock};

use regex::Regex;

use crate::normalize::normalize;

// ─── Labels ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
  Greeting,
  Thanks,
  Bye,
  HowAreYou,
  WhoAreYou,
  Tracking,
  Cancel,
  Defective,
  Return,
  Customs,
  ShippingCost,
  Shipping,
  ShipToUsa,
  ShipToCountry,
  Countries,
  Expiry,
  Packaging,
  Availability,
  Bulk,
  Minimum,
  Discount,
  Support,
  Account,
  Organic,
  Halal,
  Vegan,
  Gluten,
  GheeBad,
  Ghee,
  RiceBad,
  Rice,
  AttaBad,
  Atta,
  Dal,
  Oil,
  Spices,
  Tea,
  Snacks,
  Pickle,
  Payment,
}

impl Intent {
  pub fn as_str(&self) -> &'static str {
    match self {
      Intent::Greeting => "greeting",
      Intent::Thanks => "thanks",
      Intent::Bye => "bye",
      Intent::HowAreYou => "how_are_you",
      Intent::WhoAreYou => "who_are_you",
      Intent::Tracking => "tracking",
      Intent::Cancel => "cancel",
      Intent::Defective => "defective",
      Intent::Return => "return",
      Intent::Customs => "customs",
      Intent::ShippingCost => "shipping_cost",
      Intent::Shipping => "shipping",
      Intent::ShipToUsa => "ship_to_usa",
      Intent::ShipToCountry => "ship_to_country",
      Intent::Countries => "countries",
      Intent::Expiry => "expiry",
      Intent::Packaging => "packaging",
      Intent::Availability => "availability",
      Intent::Bulk => "bulk",
      Intent::Minimum => "minimum",
      Intent::Discount => "discount",
      Intent::Support => "support",
      Intent::Account => "account",
      Intent::Organic => "organic",
      Intent::Halal => "halal",
      Intent::Vegan => "vegan",
      Intent::Gluten => "gluten",
      Intent::GheeBad => "ghee_bad",
      Intent::Ghee => "ghee",
      Intent::RiceBad => "rice_bad",
      Intent::Rice => "rice",
      Intent::AttaBad => "atta_bad",
      Intent::Atta => "atta",
      Intent::Dal => "dal",
      Intent::Oil => "oil",
      Intent::Spices => "spices",
      Intent::Tea => "tea",
      Intent::Snacks => "snacks",
      Intent::Pickle => "pickle",
      Intent::Payment => "payment",
    }
  }

  /// Id of the KB entry that answers this intent deterministically. The
  /// entry may be absent from the KB, in which case matching falls through.
  pub fn kb_id(&self) -> &'static str {
    match self {
      Intent::Greeting => "greeting",
      Intent::Thanks => "thanks",
      Intent::Bye => "bye",
      Intent::HowAreYou => "how_are_you",
      Intent::WhoAreYou => "who_are_you",
      Intent::Payment => "payment_methods",
      Intent::Shipping => "shipping_time",
      Intent::ShippingCost => "shipping_cost",
      Intent::Customs => "custom_duty",
      Intent::Return => "return_policy",
      Intent::Defective => "defective_product",
      Intent::Tracking => "order_tracking",
      Intent::Cancel => "cancel_order",
      Intent::Availability => "product_availability",
      Intent::Bulk => "bulk_order",
      Intent::Countries => "countries_shipping",
      Intent::ShipToUsa => "ship_to_usa",
      Intent::ShipToCountry => "ship_to_country",
      Intent::Expiry => "product_expiry",
      Intent::Packaging => "packaging_quality",
      Intent::Minimum => "minimum_order",
      Intent::Support => "customer_support",
      Intent::Account => "account_creation",
      Intent::Discount => "discount_coupons",
      Intent::Organic => "organic_products",
      Intent::Halal => "halal_products",
      Intent::Vegan => "vegan_products",
      Intent::Gluten => "gluten_free",
      Intent::Ghee => "ghee_brand_good",
      Intent::GheeBad => "ghee_brand_bad",
      Intent::Rice => "rice_brand_good",
      Intent::RiceBad => "rice_brand_bad",
      Intent::Atta => "atta_brand_good",
      Intent::AttaBad => "atta_brand_bad",
      Intent::Dal => "dal_brand_good",
      Intent::Oil => "oil_brand_good",
      Intent::Spices => "spices_brand_good",
      Intent::Tea => "tea_brand_good",
      Intent::Snacks => "snacks_brand_good",
      Intent::Pickle => "pickle_brand_good",
    }
  }
}

impl fmt::Display for Intent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Rule table ──────────────────────────────────────────────────────────────

const SHIP_VERB: &str = r"ship|deliver|available|get.*product|send";
const BAD: &str = r"bad|worst|avoid|poor|terrible|not good|should.*avoid";
const GOOD: &str = r"good|best|recommend|which|top|should.*buy|suggest";

/// Ordered cascade. Every pattern in a row must match.
const RULES: &[(Intent, &[&str])] = &[
  // conversational
  (Intent::Greeting, &[r"^(hi|hello|hey|good morning|good afternoon|good evening)$"]),
  (Intent::Thanks, &[r"^(thank you|thanks|thx|appreciate)$"]),
  (Intent::Bye, &[r"^(bye|goodbye|see you|see ya)$"]),
  (Intent::HowAreYou, &[r"how are you|how r u|whats up|what's up|how's it going"]),
  (Intent::WhoAreYou, &[r"who are you|what are you|what is this|what can you do|^help$"]),
  // orders and problems
  (Intent::Tracking, &[r"track|where is my order|order status|tracking number|check order"]),
  (Intent::Cancel, &[r"cancel|stop order|cancel my order"]),
  (
    Intent::Defective,
    &[r"defective|damaged|broken|expired|quality issue|bad quality|received damaged"],
  ),
  (
    Intent::Return,
    &[r"return|refund|exchange|money back|return policy|returns allowed"],
  ),
  // money before the generic "pay" and "ship" rules
  (Intent::Customs, &[r"custom|duty|import tax|customs fee|customs charge"]),
  (
    Intent::ShippingCost,
    &[
      r"shipping cost|delivery fee|delivery charge|shipping charge|free shipping|how much.*ship|how much.*deliver",
    ],
  ),
  (
    Intent::Shipping,
    &[r"how long|when will.*arrive|delivery time|shipping.*take|how many days|how fast"],
  ),
  // destinations
  (Intent::ShipToUsa, &[r"america|usa|united states|us\b", SHIP_VERB]),
  (
    Intent::ShipToCountry,
    &[r"canada|uk|united kingdom|australia|germany|singapore|uae|dubai", SHIP_VERB],
  ),
  (
    Intent::Countries,
    &[r"which countries|ship to|deliver to|international|do you ship|shipping locations"],
  ),
  // product and order policy
  (Intent::Expiry, &[r"expiry|expire|shelf life|fresh|expiration|how long.*last"]),
  (Intent::Packaging, &[r"packaging|pack|will.*break|secure|safe delivery|how.*packed"]),
  (
    Intent::Availability,
    &[r"available|stock|out of stock|have this|do you have|in stock"],
  ),
  (Intent::Bulk, &[r"bulk|wholesale|large quantity|business order|order.*bulk"]),
  (Intent::Minimum, &[r"minimum order|minimum purchase|small order|minimum.*value"]),
  (Intent::Discount, &[r"discount|coupon|promo|offer|sale|deal|code"]),
  (
    Intent::Support,
    &[r"contact|support|help|customer service|email|phone|talk to|reach you"],
  ),
  (
    Intent::Account,
    &[r"account|sign up|register|guest checkout|create account|need.*account"],
  ),
  // dietary
  (Intent::Organic, &[r"organic|chemical free|natural|organic products"]),
  (Intent::Halal, &[r"halal|muslim|islamic|halal certified"]),
  (Intent::Vegan, &[r"vegan|plant based|no dairy|vegan products"]),
  (Intent::Gluten, &[r"gluten free|celiac|no wheat|gluten free products"]),
  // brand recommendations, "bad" before "good"
  (Intent::GheeBad, &[r"ghee", BAD]),
  (Intent::Ghee, &[r"ghee", GOOD]),
  (Intent::RiceBad, &[r"rice|basmati", BAD]),
  (Intent::Rice, &[r"rice|basmati", GOOD]),
  (Intent::AttaBad, &[r"atta|flour|wheat", BAD]),
  (Intent::Atta, &[r"atta|flour|wheat", GOOD]),
  (Intent::Dal, &[r"dal|pulses|lentils", GOOD]),
  (Intent::Oil, &[r"oil|cooking oil", GOOD]),
  (Intent::Spices, &[r"spice|masala", GOOD]),
  (Intent::Tea, &[r"tea|chai", GOOD]),
  (Intent::Snacks, &[r"snack|namkeen", GOOD]),
  (Intent::Pickle, &[r"pickle|achar", GOOD]),
  // generic, last
  (Intent::Payment, &[r"pay|payment|card|credit|debit|upi|cod|cash|paypal|netbank"]),
  (Intent::Shipping, &[r"ship|delivery|deliver"]),
];

/// A compiled cascade row.
pub struct Rule {
  pub intent:   Intent,
  pub patterns: Vec<Regex>,
}

impl Rule {
  pub fn matches(&self, normalized: &str) -> bool {
    self.patterns.iter().all(|p| p.is_match(normalized))
  }
}

static CASCADE: LazyLock<Vec<Rule>> = LazyLock::new(|| {
  RULES
    .iter()
    .map(|(intent, patterns)| Rule {
      intent:   *intent,
      patterns: patterns
        .iter()
        .map(|p| Regex::new(p).expect("intent pattern is valid"))
        .collect(),
    })
    .collect()
});

/// The compiled cascade, in evaluation order.
pub fn cascade() -> &'static [Rule] {
  &CASCADE
}

/// Classify `raw` with the first matching cascade rule.
pub fn detect_intent(raw: &str) -> Option<Intent> {
  let q = normalize(raw);
  cascade().iter().find(|rule| rule.matches(&q)).map(|rule| rule.intent)
}

// ─── Order ids ───────────────────────────────────────────────────────────────

/// An order-related message and the order id found in it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderIntent {
  /// Uppercased with whitespace removed, e.g. `ORD123`.
  pub order_id: Option<String>,
}

static ORDER_WORDS: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"\b(order|track|tracking|where\sis|where's|dispatched|delivered|shipped|shipment)\b",
  )
  .expect("order pattern is valid")
});

static ORDER_ID: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?i)\b(ord-?\d+|ord\s*\d+)\b").expect("order id pattern is valid")
});

/// Detect order-related vocabulary and pull out an `ORD…` id when present.
pub fn detect_order_intent(raw: &str) -> Option<OrderIntent> {
  let q = normalize(raw);
  if !ORDER_WORDS.is_match(&q) {
    return None;
  }
  let order_id = ORDER_ID.find(&q).map(|m| {
    m.as_str()
      .chars()
      .filter(|c| !c.is_whitespace())
      .collect::<String>()
      .to_uppercase()
  });
  Some(OrderIntent { order_id })
}
