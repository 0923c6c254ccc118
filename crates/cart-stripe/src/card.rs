//! # Card Form
//!
//! What the shopper typed into the card surface, and the pre-submit checks
//! run on it before anything is sent to Stripe.

use chrono::{Datelike, Utc};

/// Card input: either a tokenized payment method or raw card fields
#[derive(Clone, PartialEq)]
pub enum CardInput {
    /// Previously tokenized payment method (pm_...)
    PaymentMethod(String),
    /// Card fields entered by the shopper
    Card(CardDetails),
}

impl std::fmt::Debug for CardInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardInput::PaymentMethod(id) => f.debug_tuple("PaymentMethod").field(id).finish(),
            CardInput::Card(card) => f.debug_tuple("Card").field(card).finish(),
        }
    }
}

/// Raw card fields
#[derive(Clone, PartialEq)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: i32,
    pub cvc: String,
    pub cardholder_name: Option<String>,
    pub postal_code: Option<String>,
}

impl std::fmt::Debug for CardDetails {
    // never print the PAN or CVC
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("last4", &self.last4())
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

impl CardDetails {
    pub fn new(number: impl Into<String>, exp_month: u32, exp_year: i32, cvc: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            exp_month,
            exp_year,
            cvc: cvc.into(),
            cardholder_name: None,
            postal_code: None,
        }
    }

    /// Builder: set cardholder name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.cardholder_name = Some(name.into());
        self
    }

    /// Builder: set billing postal code
    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    /// Card number without spaces or dashes
    pub fn digits(&self) -> String {
        self.number
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect()
    }

    pub fn last4(&self) -> String {
        let digits: Vec<char> = self.digits().chars().collect();
        let start = digits.len().saturating_sub(4);
        digits[start..].iter().collect()
    }

    /// Pre-submit checks; `Err` carries the message shown next to the form
    pub fn validate(&self) -> Result<(), String> {
        let digits = self.digits();
        if digits.len() < 12 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err("Your card number is incomplete.".to_string());
        }
        if digits.len() > 19 || !luhn_valid(&digits) {
            return Err("Your card number is invalid.".to_string());
        }
        if !(1..=12).contains(&self.exp_month) {
            return Err("Your card's expiration date is invalid.".to_string());
        }
        let now = Utc::now();
        let expired = self.exp_year < now.year()
            || (self.exp_year == now.year() && self.exp_month < now.month());
        if expired {
            return Err("Your card's expiration year is in the past.".to_string());
        }
        let cvc_ok = (3..=4).contains(&self.cvc.len()) && self.cvc.chars().all(|c| c.is_ascii_digit());
        if !cvc_ok {
            return Err("Your card's security code is incomplete.".to_string());
        }
        Ok(())
    }

    /// Form parameters for `payment_method_data`
    pub(crate) fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("payment_method_data[type]".to_string(), "card".to_string()),
            ("payment_method_data[card][number]".to_string(), self.digits()),
            ("payment_method_data[card][exp_month]".to_string(), self.exp_month.to_string()),
            ("payment_method_data[card][exp_year]".to_string(), self.exp_year.to_string()),
            ("payment_method_data[card][cvc]".to_string(), self.cvc.clone()),
        ];
        if let Some(ref name) = self.cardholder_name {
            params.push(("payment_method_data[billing_details][name]".to_string(), name.clone()));
        }
        if let Some(ref postal) = self.postal_code {
            params.push((
                "payment_method_data[billing_details][address][postal_code]".to_string(),
                postal.clone(),
            ));
        }
        params
    }
}

/// Luhn checksum over an all-digit string
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
