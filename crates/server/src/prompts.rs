//! System prompts for the business assistant.
//!
//! Each [`PromptKind`] renders one askama text template from
//! `templates/prompts/`. Rendering is deterministic: the same snapshot and
//! kind always give the same prompt, since templates contain no clock or
//! randomness and every breakdown is an ordered map.

use std::collections::BTreeMap;
use std::fmt::Display;

use askama::Template;
use thiserror::Error;

use leafspring_crm_core::CustomerId;

use crate::models::{Customer, Inquiry, Order, Product};
use crate::snapshot::BusinessSnapshot;

/// Customers listed in the general prompt.
pub const CUSTOMER_SAMPLE: usize = 20;
/// Orders listed in the general prompt.
pub const ORDER_SAMPLE: usize = 10;
/// Inquiries listed in the general prompt.
pub const INQUIRY_SAMPLE: usize = 10;

/// Errors that can occur while building a prompt.
#[derive(Debug, Error)]
pub enum PromptError {
    /// The customer to analyze does not exist.
    #[error("customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// A template failed to render.
    #[error("template error: {0}")]
    Render(#[from] askama::Error),

    /// A record could not be serialized for the prompt.
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Which task the assistant is prompted for.
#[derive(Debug, Clone, Copy)]
pub enum PromptKind<'a> {
    /// Free-form questions about the CRM data.
    General,
    /// Research on an outside company; carries no CRM data.
    CompanyResearch { subject: &'a str },
    /// Analysis of one customer and their history.
    CustomerAnalysis { customer_id: &'a CustomerId },
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "prompts/general.txt")]
struct GeneralPrompt {
    customer_count: usize,
    order_count: usize,
    pending_orders: usize,
    inquiry_count: usize,
    new_inquiries: usize,
    product_count: usize,
    by_type: Vec<String>,
    by_tier: Vec<String>,
    by_country: Vec<String>,
    orders_by_status: Vec<String>,
    inquiries_by_status: Vec<String>,
    customer_limit: usize,
    customers: Vec<String>,
    order_limit: usize,
    orders: Vec<String>,
    inquiry_limit: usize,
    inquiries: Vec<String>,
    products: Vec<String>,
}

#[derive(Template)]
#[template(path = "prompts/company_research.txt")]
struct CompanyResearchPrompt<'a> {
    subject: &'a str,
}

#[derive(Template)]
#[template(path = "prompts/customer_analysis.txt")]
struct CustomerAnalysisPrompt {
    customer: String,
    order_count: usize,
    orders: Vec<String>,
    inquiry_count: usize,
    inquiries: Vec<String>,
}

// =============================================================================
// Building
// =============================================================================

/// Render the system prompt for `kind` from `snapshot`.
///
/// # Errors
///
/// Returns `PromptError::CustomerNotFound` if a customer analysis names an
/// unknown customer, or a rendering error.
pub fn build_system_prompt(
    kind: PromptKind<'_>,
    snapshot: &BusinessSnapshot,
) -> Result<String, PromptError> {
    match kind {
        PromptKind::General => general(snapshot),
        PromptKind::CompanyResearch { subject } => {
            Ok(CompanyResearchPrompt { subject: subject.trim() }.render()?)
        }
        PromptKind::CustomerAnalysis { customer_id } => customer_analysis(customer_id, snapshot),
    }
}

fn general(snapshot: &BusinessSnapshot) -> Result<String, PromptError> {
    let template = GeneralPrompt {
        customer_count: snapshot.customers.len(),
        order_count: snapshot.orders.len(),
        pending_orders: snapshot.pending_orders(),
        inquiry_count: snapshot.inquiries.len(),
        new_inquiries: snapshot.new_inquiries(),
        product_count: snapshot.products.len(),
        by_type: breakdown(&snapshot.customers_by_type()),
        by_tier: breakdown(&snapshot.customers_by_tier()),
        by_country: breakdown(&snapshot.customers_by_country()),
        orders_by_status: breakdown(&snapshot.orders_by_status()),
        inquiries_by_status: breakdown(&snapshot.inquiries_by_status()),
        customer_limit: CUSTOMER_SAMPLE,
        customers: lines(snapshot.sample_customers(CUSTOMER_SAMPLE), customer_line),
        order_limit: ORDER_SAMPLE,
        orders: lines(snapshot.sample_orders(ORDER_SAMPLE), order_line),
        inquiry_limit: INQUIRY_SAMPLE,
        inquiries: lines(snapshot.sample_inquiries(INQUIRY_SAMPLE), inquiry_line),
        products: lines(&snapshot.products, product_line),
    };
    Ok(template.render()?)
}

fn customer_analysis(
    customer_id: &CustomerId,
    snapshot: &BusinessSnapshot,
) -> Result<String, PromptError> {
    let customer = snapshot
        .customer(customer_id)
        .ok_or_else(|| PromptError::CustomerNotFound(customer_id.clone()))?;
    let orders = snapshot.orders_for(customer_id);
    let inquiries = snapshot.inquiries_for(customer_id);

    let template = CustomerAnalysisPrompt {
        customer: serde_json::to_string_pretty(customer)?,
        order_count: orders.len(),
        orders: lines(orders, order_line),
        inquiry_count: inquiries.len(),
        inquiries: lines(inquiries, inquiry_line),
    };
    Ok(template.render()?)
}

// =============================================================================
// Line formatting
// =============================================================================

const NONE: &str = "none";

fn lines<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    describe: impl Fn(&T) -> String,
) -> Vec<String> {
    let out: Vec<String> = items.into_iter().map(describe).collect();
    if out.is_empty() {
        vec![NONE.to_string()]
    } else {
        out
    }
}

fn breakdown<K: Display>(counts: &BTreeMap<K, usize>) -> Vec<String> {
    if counts.is_empty() {
        return vec![NONE.to_string()];
    }
    counts
        .iter()
        .map(|(key, count)| format!("{key}: {count}"))
        .collect()
}

/// `head | label: value | ...`, skipping empty values.
fn describe(head: &str, fields: &[(&str, Option<String>)]) -> String {
    let mut line = head.to_string();
    for (label, value) in fields {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            line.push_str(" | ");
            line.push_str(label);
            line.push_str(": ");
            line.push_str(value);
        }
    }
    line
}

fn customer_line(c: &Customer) -> String {
    describe(
        &c.name,
        &[
            ("company", c.company.clone()),
            ("country", c.country.clone()),
            ("type", c.customer_type.clone()),
            ("tier", c.tier.clone()),
            ("status", c.status.clone()),
            ("since", Some(c.created_at.format("%Y-%m-%d").to_string())),
        ],
    )
}

fn order_line(o: &Order) -> String {
    let customer = o
        .customer_name
        .clone()
        .or_else(|| o.customer_id.as_ref().map(ToString::to_string));
    describe(
        o.id.as_str(),
        &[
            ("customer", customer),
            ("product", o.product_name.clone()),
            ("quantity", o.quantity.map(|q| q.normalize().to_string())),
            ("amount", o.total_amount.map(|a| a.normalize().to_string())),
            ("status", Some(o.status.to_string())),
            ("date", Some(o.created_at.format("%Y-%m-%d").to_string())),
        ],
    )
}

fn inquiry_line(i: &Inquiry) -> String {
    let customer = i
        .customer_name
        .clone()
        .or_else(|| i.customer_id.as_ref().map(ToString::to_string));
    let quantity = i.quantity.as_ref().map(|q| match q {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    });
    describe(
        i.id.as_str(),
        &[
            ("customer", customer),
            ("product", i.product.clone()),
            ("quantity", quantity),
            ("content", i.content.clone()),
            ("status", Some(i.status.to_string())),
            ("date", Some(i.created_at.format("%Y-%m-%d").to_string())),
        ],
    )
}

fn product_line(p: &Product) -> String {
    let price = if p.price.is_zero() {
        "on request".to_string()
    } else {
        match p.unit.as_deref() {
            Some(unit) => format!("{} per {unit}", p.price.normalize()),
            None => p.price.normalize().to_string(),
        }
    };
    describe(
        &format!("{} {}", p.id, p.name),
        &[
            ("category", p.category.clone()),
            ("steel", p.spec.clone()),
            ("thickness", p.thickness.clone()),
            ("width", p.width.clone()),
            ("price", Some(price)),
        ],
    )
}
