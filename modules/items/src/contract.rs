//! Item contract - CRUD over the world state
//!
//! Every operation runs against the [`TransactionContext`] the host opened
//! for the invocation. The contract itself keeps no state between calls.

use itemledger_core::{LedgerError, LedgerResult, TransactionContext};
use tracing::{debug, info};

use crate::item::{decode, encode, Item};
use crate::seed::{SeedConfig, SeedInitializer};

pub const INIT_LEDGER: &str = "InitLedger";
pub const CREATE_ITEM: &str = "CreateItem";
pub const READ_ITEM: &str = "ReadItem";
pub const UPDATE_ITEM: &str = "UpdateItem";
pub const DELETE_ITEM: &str = "DeleteItem";
pub const ITEM_EXISTS: &str = "ItemExists";
pub const GET_ALL_ITEMS: &str = "GetAllItems";

/// Key reported for errors raised by a full-range scan
const FULL_RANGE: &str = "*";

/// Item record contract
#[derive(Debug, Clone, Default)]
pub struct ItemContract {
    seed: SeedConfig,
}

impl ItemContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contract whose `InitLedger` writes `seed` instead of the default set
    pub fn with_seed(seed: SeedConfig) -> Self {
        Self { seed }
    }

    pub fn seed_config(&self) -> &SeedConfig {
        &self.seed
    }

    /// Write the bootstrap records.
    ///
    /// Not atomic across records: the first failure is returned and anything
    /// written before it stays staged in `ctx`.
    pub fn init_ledger(&self, ctx: &dyn TransactionContext) -> LedgerResult<()> {
        let written = SeedInitializer::new(self, &self.seed).initialize(ctx)?;
        info!("Ledger initialized with {} item(s)", written);
        Ok(())
    }

    /// Write an item under `id`, replacing whatever is stored there
    pub fn create_item(
        &self,
        ctx: &dyn TransactionContext,
        id: &str,
        name: &str,
        price: i64,
    ) -> LedgerResult<()> {
        let item = Item::new(id, name, price);
        let bytes = encode(CREATE_ITEM, &item)?;

        ctx.put_state(id, &bytes)
            .map_err(|e| e.in_op(CREATE_ITEM, id))?;

        debug!("Created item {}", item);
        Ok(())
    }

    pub fn read_item(&self, ctx: &dyn TransactionContext, id: &str) -> LedgerResult<Item> {
        let bytes = ctx
            .get_state(id)
            .map_err(|e| e.in_op(READ_ITEM, id))?
            .ok_or_else(|| LedgerError::NotFound {
                op: READ_ITEM,
                key: id.to_string(),
            })?;

        decode(READ_ITEM, id, &bytes)
    }

    /// Replace `name` and `price` of an existing item
    pub fn update_item(
        &self,
        ctx: &dyn TransactionContext,
        id: &str,
        name: &str,
        price: i64,
    ) -> LedgerResult<()> {
        let mut item = self.read_item(ctx, id)?;
        item.name = name.to_string();
        item.price = price;

        let bytes = encode(UPDATE_ITEM, &item)?;
        ctx.put_state(id, &bytes)
            .map_err(|e| e.in_op(UPDATE_ITEM, id))?;

        debug!("Updated item {}", item);
        Ok(())
    }

    pub fn delete_item(&self, ctx: &dyn TransactionContext, id: &str) -> LedgerResult<()> {
        if !self.item_exists(ctx, id)? {
            return Err(LedgerError::NotFound {
                op: DELETE_ITEM,
                key: id.to_string(),
            });
        }

        ctx.del_state(id).map_err(|e| e.in_op(DELETE_ITEM, id))?;

        debug!("Deleted item {}", id);
        Ok(())
    }

    pub fn item_exists(&self, ctx: &dyn TransactionContext, id: &str) -> LedgerResult<bool> {
        let bytes = ctx.get_state(id).map_err(|e| e.in_op(ITEM_EXISTS, id))?;
        Ok(bytes.is_some())
    }

    /// Every item in the world state, in key order.
    ///
    /// One undecodable record fails the whole call.
    pub fn get_all_items(&self, ctx: &dyn TransactionContext) -> LedgerResult<Vec<Item>> {
        let mut scan = ctx
            .get_state_by_range("", "")
            .map_err(|e| e.in_op(GET_ALL_ITEMS, FULL_RANGE))?;

        let mut items = Vec::new();
        for entry in scan.by_ref() {
            let entry = entry.map_err(|e| e.in_op(GET_ALL_ITEMS, FULL_RANGE))?;
            items.push(decode(GET_ALL_ITEMS, &entry.key, &entry.value)?);
        }
        scan.close();

        Ok(items)
    }
}
