//! Catalog Store
//!
//! Chains, prompts, purchases and credit wallets on top of [`Database`].
//!
//! Chain edits use replace-all-steps semantics: every step row of the chain
//! is deleted and reinserted inside one transaction.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use tracing::{debug, info};

use super::Database;
use crate::types::{
    AccessGrant, Chain, Prompt, PromptVariable, Result, ShelfError, Step, ValidationError,
    ValidationErrorKind, Viewer,
};

const ITEM_CHAIN: &str = "chain";

/// Row data for a step: (id, position, prompt_id, title_override, input_instructions, context_note, estimated_minutes)
type StepRow = (
    String,
    i64,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
);

/// Listing row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub author_id: String,
    pub is_premium: bool,
    pub price_credits: i64,
    pub is_published: bool,
    pub step_count: usize,
}

/// Listing filter. Search is a plain substring match on title and description.
#[derive(Debug, Clone, Default)]
pub struct ChainFilter {
    pub search: Option<String>,
    /// Hide unpublished chains except the viewer's own
    pub published_only: bool,
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// Chain is not monetized
    NotRequired,
    AlreadyOwned,
    AlreadyPurchased,
    Purchased { price: i64, balance: i64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseRecord {
    pub item_type: String,
    pub item_id: String,
    pub price_credits: i64,
    pub purchased_at: String,
}

pub struct Catalog<'a> {
    db: &'a Database,
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // =========================================================================
    // Prompts
    // =========================================================================

    /// Insert or update a prompt keyed by slug, returning its stored id.
    /// An existing prompt may only be changed by its author or an admin.
    pub fn upsert_prompt(&self, prompt: &Prompt, viewer: &Viewer) -> Result<String> {
        self.db.transaction(|conn| upsert_prompt_tx(conn, prompt, viewer))
    }

    pub fn get_prompt(&self, slug: &str) -> Result<Prompt> {
        let conn = self.db.connection()?;
        let id: Option<String> = conn
            .query_row("SELECT id FROM prompts WHERE slug = ?1", [slug], |row| {
                row.get(0)
            })
            .optional()?;
        let id = id.ok_or_else(|| ShelfError::not_found("Prompt", slug))?;
        load_prompt(&conn, &id)
    }

    // =========================================================================
    // Chains
    // =========================================================================

    /// Create or replace a chain. An existing chain with the same slug keeps
    /// its id and may only be replaced by its author or an admin.
    pub fn save_chain(&self, chain: &Chain, viewer: &Viewer) -> Result<String> {
        let mut chain = chain.clone();
        chain.sort_steps();
        chain.validate()?;

        if let Some((existing_id, author_id)) = self.chain_owner(&chain.slug)? {
            if author_id != viewer.id.as_str() && !viewer.is_admin {
                return Err(ShelfError::Forbidden(format!(
                    "chain '{}' belongs to {}",
                    chain.slug, author_id
                )));
            }
            chain.id = existing_id;
            chain.author_id = author_id;
        }

        let chain_ref = &chain;
        self.db.transaction(move |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                r#"
                INSERT INTO chains (id, slug, title, description, author_id, is_premium, price_credits, is_published, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    slug = excluded.slug,
                    title = excluded.title,
                    description = excluded.description,
                    is_premium = excluded.is_premium,
                    price_credits = excluded.price_credits,
                    is_published = excluded.is_published,
                    updated_at = excluded.updated_at
                "#,
                params![
                    chain_ref.id,
                    chain_ref.slug,
                    chain_ref.title,
                    chain_ref.description,
                    chain_ref.author_id,
                    chain_ref.is_premium,
                    chain_ref.price_credits,
                    chain_ref.is_published,
                    now,
                ],
            )?;

            let removed = conn.execute(
                "DELETE FROM chain_steps WHERE chain_id = ?1",
                [&chain_ref.id],
            )?;

            for step in &chain_ref.steps {
                let prompt_id = upsert_prompt_tx(conn, &step.prompt, viewer)?;
                conn.execute(
                    r#"
                    INSERT INTO chain_steps (id, chain_id, position, prompt_id, title_override, input_instructions, context_note, estimated_minutes)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        uuid::Uuid::new_v4().to_string(),
                        chain_ref.id,
                        step.position as i64,
                        prompt_id,
                        step.title_override,
                        step.input_instructions,
                        step.context_note,
                        step.estimated_minutes.map(i64::from),
                    ],
                )?;
            }

            debug!(
                chain = %chain_ref.slug,
                removed,
                inserted = chain_ref.steps.len(),
                "Replaced chain steps"
            );
            Ok(())
        })?;

        info!("Saved chain '{}' ({} steps)", chain.slug, chain.steps.len());
        Ok(chain.id)
    }

    /// Chain with its steps in position order
    pub fn get_chain(&self, slug: &str) -> Result<Chain> {
        let conn = self.db.connection()?;

        let chain = conn
            .query_row(
                "SELECT id, slug, title, description, author_id, is_premium, price_credits, is_published
                 FROM chains WHERE slug = ?1",
                [slug],
                |row| {
                    Ok(Chain {
                        id: row.get(0)?,
                        slug: row.get(1)?,
                        title: row.get(2)?,
                        description: row.get(3)?,
                        author_id: row.get(4)?,
                        is_premium: row.get(5)?,
                        price_credits: row.get(6)?,
                        is_published: row.get(7)?,
                        steps: Vec::new(),
                    })
                },
            )
            .optional()?;
        let mut chain = chain.ok_or_else(|| ShelfError::not_found("Chain", slug))?;

        let rows: Vec<StepRow> = {
            let mut stmt = conn.prepare(
                "SELECT id, position, prompt_id, title_override, input_instructions, context_note, estimated_minutes
                 FROM chain_steps WHERE chain_id = ?1 ORDER BY position",
            )?;
            let rows = stmt
                .query_map([&chain.id], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<StepRow>, _>>()?;
            rows
        };

        for (id, position, prompt_id, title_override, input_instructions, context_note, minutes) in
            rows
        {
            chain.steps.push(Step {
                id,
                position: position.max(0) as usize,
                prompt: load_prompt(&conn, &prompt_id)?,
                title_override,
                input_instructions,
                context_note,
                estimated_minutes: minutes.and_then(|m| u32::try_from(m).ok()),
            });
        }

        Ok(chain)
    }

    pub fn list_chains(&self, filter: &ChainFilter, viewer: &Viewer) -> Result<Vec<ChainSummary>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            values.push(Box::new(format!("%{}%", search.trim())));
            let idx = values.len();
            clauses.push(format!(
                "(c.title LIKE ?{idx} OR COALESCE(c.description, '') LIKE ?{idx})"
            ));
        }

        if filter.published_only {
            values.push(Box::new(viewer.id.as_str().to_string()));
            clauses.push(format!("(c.is_published = 1 OR c.author_id = ?{})", values.len()));
        }

        if let Some(author) = &filter.author {
            values.push(Box::new(author.clone()));
            clauses.push(format!("c.author_id = ?{}", values.len()));
        }

        let mut query = String::from(
            "SELECT c.id, c.slug, c.title, c.description, c.author_id, c.is_premium, c.price_credits, c.is_published,
                    (SELECT COUNT(*) FROM chain_steps s WHERE s.chain_id = c.id)
             FROM chains c",
        );
        if !clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&clauses.join(" AND "));
        }
        query.push_str(" ORDER BY c.title COLLATE NOCASE, c.slug");

        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), |row| {
                Ok(ChainSummary {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    author_id: row.get(4)?,
                    is_premium: row.get(5)?,
                    price_credits: row.get(6)?,
                    is_published: row.get(7)?,
                    step_count: row.get::<_, i64>(8)?.max(0) as usize,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Delete a chain (owner or admin). Prompts are kept.
    pub fn delete_chain(&self, slug: &str, viewer: &Viewer) -> Result<()> {
        let (id, author_id) = self
            .chain_owner(slug)?
            .ok_or_else(|| ShelfError::not_found("Chain", slug))?;

        if author_id != viewer.id.as_str() && !viewer.is_admin {
            return Err(ShelfError::Forbidden(format!(
                "only the author or an admin may delete '{}'",
                slug
            )));
        }

        self.db
            .execute("DELETE FROM chains WHERE id = ?1", &[&id])?;
        info!("Deleted chain '{}'", slug);
        Ok(())
    }

    fn chain_owner(&self, slug: &str) -> Result<Option<(String, String)>> {
        let conn = self.db.connection()?;
        Ok(conn
            .query_row(
                "SELECT id, author_id FROM chains WHERE slug = ?1",
                [slug],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Ownership, purchase, or a free chain grants access
    pub fn resolve_access(&self, viewer: &Viewer, chain: &Chain) -> Result<AccessGrant> {
        if chain.author_id == viewer.id.as_str() {
            return Ok(AccessGrant::Owner);
        }
        if !chain.is_premium {
            return Ok(AccessGrant::Free);
        }
        if self.has_purchase(viewer, ITEM_CHAIN, &chain.id)? {
            return Ok(AccessGrant::Purchased);
        }
        Ok(AccessGrant::None)
    }

    fn has_purchase(&self, viewer: &Viewer, item_type: &str, item_id: &str) -> Result<bool> {
        let conn = self.db.connection()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM purchases WHERE viewer_id = ?1 AND item_type = ?2 AND item_id = ?3",
                params![viewer.id.as_str(), item_type, item_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn purchases(&self, viewer: &Viewer) -> Result<Vec<PurchaseRecord>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT item_type, item_id, price_credits, purchased_at
             FROM purchases WHERE viewer_id = ?1 ORDER BY purchased_at",
        )?;
        let rows = stmt
            .query_map([viewer.id.as_str()], |row| {
                Ok(PurchaseRecord {
                    item_type: row.get(0)?,
                    item_id: row.get(1)?,
                    price_credits: row.get(2)?,
                    purchased_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // =========================================================================
    // Wallet & Purchases
    // =========================================================================

    pub fn wallet_balance(&self, viewer: &Viewer) -> Result<i64> {
        let conn = self.db.connection()?;
        balance_tx(&conn, viewer.id.as_str())
    }

    /// Add credits, returning the new balance
    pub fn credit_wallet(&self, viewer: &Viewer, amount: i64) -> Result<i64> {
        if amount <= 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::Range,
                format!("credit amount must be positive, got {}", amount),
            )
            .with_field("amount")
            .into());
        }

        let viewer_id = viewer.id.as_str();
        self.db.transaction(move |conn| {
            conn.execute(
                "INSERT INTO wallets (viewer_id, balance, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(viewer_id) DO UPDATE SET
                     balance = balance + excluded.balance,
                     updated_at = excluded.updated_at",
                params![viewer_id, amount, Utc::now().to_rfc3339()],
            )?;
            balance_tx(conn, viewer_id)
        })
    }

    /// Buy a premium chain with wallet credits
    pub fn purchase_chain(&self, slug: &str, viewer: &Viewer) -> Result<PurchaseOutcome> {
        let chain = self.get_chain(slug)?;

        match self.resolve_access(viewer, &chain)? {
            AccessGrant::Owner => return Ok(PurchaseOutcome::AlreadyOwned),
            AccessGrant::Free => return Ok(PurchaseOutcome::NotRequired),
            AccessGrant::Purchased => return Ok(PurchaseOutcome::AlreadyPurchased),
            AccessGrant::None => {}
        }

        let viewer_id = viewer.id.as_str();
        let chain_id = chain.id.as_str();
        let price = chain.price_credits;

        let balance = self.db.transaction(move |conn| {
            let available = balance_tx(conn, viewer_id)?;
            if available < price {
                return Err(ShelfError::InsufficientCredits {
                    required: price,
                    available,
                });
            }

            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO wallets (viewer_id, balance, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(viewer_id) DO UPDATE SET
                     balance = excluded.balance,
                     updated_at = excluded.updated_at",
                params![viewer_id, available - price, now],
            )?;
            conn.execute(
                "INSERT INTO purchases (id, viewer_id, item_type, item_id, price_credits, purchased_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    uuid::Uuid::new_v4().to_string(),
                    viewer_id,
                    ITEM_CHAIN,
                    chain_id,
                    price,
                    now
                ],
            )?;
            Ok(available - price)
        })?;

        info!("Purchased chain '{}' for {} credits", slug, price);
        Ok(PurchaseOutcome::Purchased { price, balance })
    }
}

// =============================================================================
// Connection-level helpers (usable inside transactions)
// =============================================================================

fn balance_tx(conn: &Connection, viewer_id: &str) -> Result<i64> {
    let balance: Option<i64> = conn
        .query_row(
            "SELECT balance FROM wallets WHERE viewer_id = ?1",
            [viewer_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(balance.unwrap_or(0))
}

fn upsert_prompt_tx(conn: &Connection, prompt: &Prompt, viewer: &Viewer) -> Result<String> {
    let existing: Option<(String, String)> = conn
        .query_row(
            "SELECT id, author_id FROM prompts WHERE slug = ?1",
            [&prompt.slug],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let id = match existing {
        Some((id, author_id)) => {
            if author_id != viewer.id.as_str() && !viewer.is_admin {
                return Err(ShelfError::Forbidden(format!(
                    "prompt '{}' belongs to {}",
                    prompt.slug, author_id
                )));
            }
            id
        }
        None => prompt.id.clone(),
    };
    let now = Utc::now().to_rfc3339();

    conn.execute(
        r#"
        INSERT INTO prompts (id, slug, title, description, prompt_text, author_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            prompt_text = excluded.prompt_text,
            updated_at = excluded.updated_at
        "#,
        params![
            id,
            prompt.slug,
            prompt.title,
            prompt.description,
            prompt.prompt_text,
            prompt.author_id,
            now,
        ],
    )?;

    conn.execute("DELETE FROM prompt_variables WHERE prompt_id = ?1", [&id])?;
    for (position, variable) in prompt.variables.iter().enumerate() {
        conn.execute(
            "INSERT INTO prompt_variables (prompt_id, position, name, description) VALUES (?1, ?2, ?3, ?4)",
            params![id, position as i64, variable.name, variable.description],
        )?;
    }

    Ok(id)
}

fn load_prompt(conn: &Connection, id: &str) -> Result<Prompt> {
    let prompt = conn
        .query_row(
            "SELECT id, slug, title, description, prompt_text, author_id
             FROM prompts WHERE id = ?1",
            [id],
            |row| {
                Ok(Prompt {
                    id: row.get(0)?,
                    slug: row.get(1)?,
                    title: row.get(2)?,
                    description: row.get(3)?,
                    prompt_text: row.get(4)?,
                    author_id: row.get(5)?,
                    variables: Vec::new(),
                })
            },
        )
        .optional()?;
    let mut prompt = prompt.ok_or_else(|| ShelfError::not_found("Prompt", id))?;

    let mut stmt = conn.prepare(
        "SELECT name, description FROM prompt_variables WHERE prompt_id = ?1 ORDER BY position",
    )?;
    prompt.variables = stmt
        .query_map([id], |row| {
            Ok(PromptVariable {
                name: row.get(0)?,
                description: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chain::fixtures::{chain, prompt};

    fn setup() -> Database {
        let db = Database::open_in_memory().expect("Failed to open database");
        db.initialize().expect("Failed to initialize");
        db
    }

    fn author() -> Viewer {
        Viewer::new("author-1")
    }

    #[test]
    fn test_save_and_get_chain() {
        let db = setup();
        let catalog = Catalog::new(&db);

        let c = chain(3, false);
        catalog.save_chain(&c, &author()).unwrap();

        let loaded = catalog.get_chain("test-chain").unwrap();
        assert_eq!(loaded.id, c.id);
        assert_eq!(loaded.step_count(), 3);
        assert_eq!(loaded.steps[1].position, 2);
        assert_eq!(loaded.steps[1].prompt.title, "Prompt 2");
        assert_eq!(loaded.steps[1].prompt.variables[0].name, "topic");
        assert_eq!(loaded.steps[0].estimated_minutes, Some(5));
    }

    #[test]
    fn test_edit_replaces_all_steps() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(3, false), &author()).unwrap();

        let mut edited = chain(2, false);
        edited.id = "a-new-id".to_string();
        edited.steps[0].title_override = Some("Renamed".to_string());
        let id = catalog.save_chain(&edited, &author()).unwrap();

        assert_eq!(id, "chain-1");
        let loaded = catalog.get_chain("test-chain").unwrap();
        assert_eq!(loaded.step_count(), 2);
        assert_eq!(loaded.steps[0].display_title(), "Renamed");
        assert_eq!(db.count_rows("chain_steps").unwrap(), 2);
        assert_eq!(db.count_rows("chains").unwrap(), 1);
    }

    #[test]
    fn test_invalid_chain_rejected() {
        let db = setup();
        let catalog = Catalog::new(&db);
        let mut c = chain(3, false);
        c.steps[2].position = 5;

        let err = catalog.save_chain(&c, &author()).unwrap_err();
        assert!(matches!(err, ShelfError::Validation(_)));
        assert_eq!(db.count_rows("chains").unwrap(), 0);
    }

    #[test]
    fn test_foreign_edit_forbidden_unless_admin() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(1, false), &author()).unwrap();

        let err = catalog
            .save_chain(&chain(2, false), &Viewer::new("mallory"))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Forbidden(_)));

        catalog
            .save_chain(&chain(2, false), &Viewer::admin("root"))
            .unwrap();
        let loaded = catalog.get_chain("test-chain").unwrap();
        assert_eq!(loaded.author_id, "author-1");
        assert_eq!(loaded.step_count(), 2);
    }

    #[test]
    fn test_get_missing_chain() {
        let db = setup();
        let err = Catalog::new(&db).get_chain("nope").unwrap_err();
        assert!(matches!(err, ShelfError::NotFound { kind: "Chain", .. }));
    }

    #[test]
    fn test_list_filters() {
        let db = setup();
        let catalog = Catalog::new(&db);

        let mut a = chain(2, false);
        a.title = "Morning Journal".to_string();
        catalog.save_chain(&a, &author()).unwrap();

        let mut b = chain(1, true);
        b.id = "chain-2".to_string();
        b.slug = "launch-plan".to_string();
        b.title = "Launch Plan".to_string();
        b.is_published = false;
        b.steps[0].prompt = prompt("Launch", "Plan {{product}}", &["product"]);
        catalog.save_chain(&b, &author()).unwrap();

        let all = catalog
            .list_chains(&ChainFilter::default(), &author())
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Launch Plan");
        assert_eq!(all[1].step_count, 2);

        let search = ChainFilter {
            search: Some("journal".to_string()),
            ..Default::default()
        };
        let found = catalog.list_chains(&search, &author()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "test-chain");

        let published = ChainFilter {
            published_only: true,
            ..Default::default()
        };
        let other = Viewer::new("someone-else");
        assert_eq!(catalog.list_chains(&published, &other).unwrap().len(), 1);
        assert_eq!(catalog.list_chains(&published, &author()).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_chain_permissions() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(2, false), &author()).unwrap();

        let err = catalog
            .delete_chain("test-chain", &Viewer::new("mallory"))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Forbidden(_)));

        catalog
            .delete_chain("test-chain", &Viewer::admin("root"))
            .unwrap();
        assert_eq!(db.count_rows("chains").unwrap(), 0);
        assert_eq!(db.count_rows("chain_steps").unwrap(), 0);
        assert!(db.count_rows("prompts").unwrap() > 0);
    }

    #[test]
    fn test_resolve_access() {
        let db = setup();
        let catalog = Catalog::new(&db);
        let premium = chain(1, true);
        let free = chain(1, false);
        let buyer = Viewer::new("buyer");

        assert_eq!(
            catalog.resolve_access(&author(), &premium).unwrap(),
            AccessGrant::Owner
        );
        assert_eq!(
            catalog.resolve_access(&buyer, &free).unwrap(),
            AccessGrant::Free
        );
        assert_eq!(
            catalog.resolve_access(&buyer, &premium).unwrap(),
            AccessGrant::None
        );
    }

    #[test]
    fn test_purchase_flow() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(2, true), &author()).unwrap();
        let buyer = Viewer::new("buyer");

        let err = catalog.purchase_chain("test-chain", &buyer).unwrap_err();
        assert!(matches!(
            err,
            ShelfError::InsufficientCredits {
                required: 50,
                available: 0
            }
        ));

        assert_eq!(catalog.credit_wallet(&buyer, 80).unwrap(), 80);
        let outcome = catalog.purchase_chain("test-chain", &buyer).unwrap();
        assert_eq!(
            outcome,
            PurchaseOutcome::Purchased {
                price: 50,
                balance: 30
            }
        );
        assert_eq!(catalog.wallet_balance(&buyer).unwrap(), 30);

        let c = catalog.get_chain("test-chain").unwrap();
        assert_eq!(
            catalog.resolve_access(&buyer, &c).unwrap(),
            AccessGrant::Purchased
        );

        assert_eq!(
            catalog.purchase_chain("test-chain", &buyer).unwrap(),
            PurchaseOutcome::AlreadyPurchased
        );
        assert_eq!(catalog.wallet_balance(&buyer).unwrap(), 30);
        assert_eq!(catalog.purchases(&buyer).unwrap().len(), 1);

        assert_eq!(
            catalog.purchase_chain("test-chain", &author()).unwrap(),
            PurchaseOutcome::AlreadyOwned
        );
    }

    #[test]
    fn test_free_chain_needs_no_purchase() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(1, false), &author()).unwrap();
        assert_eq!(
            catalog
                .purchase_chain("test-chain", &Viewer::new("x"))
                .unwrap(),
            PurchaseOutcome::NotRequired
        );
    }

    #[test]
    fn test_credit_must_be_positive() {
        let db = setup();
        let err = Catalog::new(&db)
            .credit_wallet(&Viewer::new("x"), 0)
            .unwrap_err();
        assert!(matches!(err, ShelfError::Validation(_)));
    }

    #[test]
    fn test_prompt_upsert_by_slug() {
        let db = setup();
        let catalog = Catalog::new(&db);

        let first = prompt("Summary", "Summarize {{text}}", &["text"]);
        let id = catalog.upsert_prompt(&first, &author()).unwrap();

        let mut second = prompt("Summary", "Briefly summarize {{text}} in {{tone}}", &["text", "tone"]);
        second.id = "different-id".to_string();
        assert_eq!(catalog.upsert_prompt(&second, &author()).unwrap(), id);

        let loaded = catalog.get_prompt("summary").unwrap();
        assert_eq!(loaded.prompt_text, "Briefly summarize {{text}} in {{tone}}");
        assert_eq!(loaded.variable_names(), vec!["text", "tone"]);

        let mut foreign = prompt("Summary", "Ignore {{text}}", &["text"]);
        foreign.author_id = "mallory".to_string();
        let err = catalog
            .upsert_prompt(&foreign, &Viewer::new("mallory"))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Forbidden(_)));
        assert_eq!(
            catalog.get_prompt("summary").unwrap().prompt_text,
            "Briefly summarize {{text}} in {{tone}}"
        );
    }

    #[test]
    fn test_shared_prompt_priced_per_chain() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(1, true), &author()).unwrap();

        let mut free = chain(1, false);
        free.id = "chain-2".to_string();
        free.slug = "free-chain".to_string();
        catalog.save_chain(&free, &author()).unwrap();

        let premium = catalog.get_chain("test-chain").unwrap();
        let free = catalog.get_chain("free-chain").unwrap();
        assert_eq!(premium.steps[0].prompt.id, free.steps[0].prompt.id);

        let buyer = Viewer::new("buyer");
        assert_eq!(
            catalog.resolve_access(&buyer, &free).unwrap(),
            AccessGrant::Free
        );
        assert_eq!(
            catalog.resolve_access(&buyer, &premium).unwrap(),
            AccessGrant::None
        );
        assert_eq!(db.count_rows("prompts").unwrap(), 1);
    }

    #[test]
    fn test_foreign_chain_cannot_rewrite_shared_prompt() {
        let db = setup();
        let catalog = Catalog::new(&db);
        catalog.save_chain(&chain(1, true), &author()).unwrap();

        let mut other = chain(1, false);
        other.id = "chain-2".to_string();
        other.slug = "other-chain".to_string();
        other.author_id = "mallory".to_string();
        other.steps[0].prompt.prompt_text = "Replaced {{topic}}".to_string();
        other.steps[0].prompt.author_id = "mallory".to_string();

        let err = catalog
            .save_chain(&other, &Viewer::new("mallory"))
            .unwrap_err();
        assert!(matches!(err, ShelfError::Forbidden(_)));

        let original = catalog.get_chain("test-chain").unwrap();
        assert_eq!(original.steps[0].prompt.prompt_text, "Write about {{topic}}");
        assert_eq!(original.steps[0].prompt.author_id, "author-1");
        assert!(catalog.chain_owner("other-chain").unwrap().is_none());
        assert_eq!(db.count_rows("chains").unwrap(), 1);

        // Admins may still edit any prompt
        catalog.save_chain(&other, &Viewer::admin("root")).unwrap();
        let shared = catalog.get_prompt("prompt-1").unwrap();
        assert_eq!(shared.prompt_text, "Replaced {{topic}}");
        assert_eq!(shared.author_id, "author-1");
    }
}
