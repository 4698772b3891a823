//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Users table schema.
#[derive(Iden)]
pub enum Users {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "username"]
    Username,
    #[iden = "password_hash"]
    PasswordHash,
    #[iden = "role"]
    Role,
    #[iden = "balance"]
    Balance,
    #[iden = "created_at"]
    CreatedAt,
}

/// Advertisements (creatives) table schema.
#[derive(Iden)]
pub enum Advertisements {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "title"]
    Title,
    #[iden = "image_url"]
    ImageUrl,
    #[iden = "target_url"]
    TargetUrl,
    #[iden = "user_id"]
    UserId,
    #[iden = "status"]
    Status,
}

/// Campaigns table schema.
#[derive(Iden)]
pub enum AdCampaigns {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "advertisement_id"]
    AdvertisementId,
    #[iden = "user_id"]
    UserId,
    #[iden = "start_date"]
    StartDate,
    #[iden = "end_date"]
    EndDate,
    #[iden = "status"]
    Status,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Recharge transactions table schema.
#[derive(Iden)]
pub enum RechargeTransactions {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "amount"]
    Amount,
    #[iden = "status"]
    Status,
    #[iden = "external_reference"]
    ExternalReference,
    #[iden = "payment_method"]
    PaymentMethod,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// Analytics events table schema.
#[derive(Iden)]
pub enum AdEvents {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "event_type"]
    EventType,
    #[iden = "advertisement_id"]
    AdvertisementId,
    #[iden = "campaign_id"]
    CampaignId,
    #[iden = "user_id"]
    UserId,
    #[iden = "event_timestamp"]
    EventTimestamp,
}

/// Invoice requests table schema.
#[derive(Iden)]
pub enum InvoiceRequests {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "user_id"]
    UserId,
    #[iden = "status"]
    Status,
    #[iden = "period_start"]
    PeriodStart,
    #[iden = "period_end"]
    PeriodEnd,
    #[iden = "total_amount"]
    TotalAmount,
    #[iden = "billing_title"]
    BillingTitle,
    #[iden = "tax_id"]
    TaxId,
    #[iden = "billing_address"]
    BillingAddress,
    #[iden = "invoice_number"]
    InvoiceNumber,
    #[iden = "notes"]
    Notes,
    #[iden = "requested_at"]
    RequestedAt,
    #[iden = "processed_at"]
    ProcessedAt,
}

/// Schema statements, applied in order.
pub const SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'User',
    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
    created_at TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS advertisements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    image_url TEXT NOT NULL,
    target_url TEXT NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id),
    status TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_advertisements_user ON advertisements(user_id)",
    r#"
CREATE TABLE IF NOT EXISTS ad_campaigns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    advertisement_id INTEGER NOT NULL REFERENCES advertisements(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK (end_date >= start_date)
)"#,
    "CREATE INDEX IF NOT EXISTS idx_ad_campaigns_user ON ad_campaigns(user_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_ad_campaigns_window ON ad_campaigns(status, start_date, end_date)",
    r#"
CREATE TABLE IF NOT EXISTS recharge_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    amount INTEGER NOT NULL CHECK (amount > 0),
    status TEXT NOT NULL,
    external_reference TEXT,
    payment_method TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_recharge_user ON recharge_transactions(user_id, created_at)",
    r#"
CREATE TABLE IF NOT EXISTS ad_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    advertisement_id INTEGER NOT NULL REFERENCES advertisements(id),
    campaign_id INTEGER NOT NULL REFERENCES ad_campaigns(id),
    user_id INTEGER NOT NULL REFERENCES users(id),
    event_timestamp TEXT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_ad_events_user ON ad_events(user_id, event_timestamp)",
    r#"
CREATE TABLE IF NOT EXISTS invoice_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    status TEXT NOT NULL,
    period_start TEXT NOT NULL,
    period_end TEXT NOT NULL,
    total_amount INTEGER NOT NULL CHECK (total_amount > 0),
    billing_title TEXT NOT NULL,
    tax_id TEXT,
    billing_address TEXT NOT NULL,
    invoice_number TEXT,
    notes TEXT,
    requested_at TEXT NOT NULL,
    processed_at TEXT
)"#,
    "CREATE INDEX IF NOT EXISTS idx_invoice_requests_user ON invoice_requests(user_id, requested_at)",
];
