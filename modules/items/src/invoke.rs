//! Named-function dispatch
//!
//! The host hands the contract a function name and string arguments, the
//! same shape a transaction proposal arrives in. Responses are JSON bytes;
//! mutating functions answer with an empty payload.

use itemledger_core::{LedgerError, LedgerResult, TransactionContext};
use std::fmt;

use crate::contract::*;

/// A parsed contract invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    InitLedger,
    CreateItem { id: String, name: String, price: i64 },
    ReadItem { id: String },
    UpdateItem { id: String, name: String, price: i64 },
    DeleteItem { id: String },
    ItemExists { id: String },
    GetAllItems,
}

impl Invocation {
    /// Parse a function name and its arguments
    pub fn parse(function: &str, args: &[String]) -> LedgerResult<Self> {
        let invocation = match function {
            INIT_LEDGER | "Seed" => {
                expect_args(INIT_LEDGER, args, 0)?;
                Invocation::InitLedger
            }
            CREATE_ITEM => {
                expect_args(CREATE_ITEM, args, 3)?;
                Invocation::CreateItem {
                    id: args[0].clone(),
                    name: args[1].clone(),
                    price: parse_price(CREATE_ITEM, &args[2])?,
                }
            }
            READ_ITEM => {
                expect_args(READ_ITEM, args, 1)?;
                Invocation::ReadItem { id: args[0].clone() }
            }
            UPDATE_ITEM => {
                expect_args(UPDATE_ITEM, args, 3)?;
                Invocation::UpdateItem {
                    id: args[0].clone(),
                    name: args[1].clone(),
                    price: parse_price(UPDATE_ITEM, &args[2])?,
                }
            }
            DELETE_ITEM => {
                expect_args(DELETE_ITEM, args, 1)?;
                Invocation::DeleteItem { id: args[0].clone() }
            }
            ITEM_EXISTS => {
                expect_args(ITEM_EXISTS, args, 1)?;
                Invocation::ItemExists { id: args[0].clone() }
            }
            GET_ALL_ITEMS => {
                expect_args(GET_ALL_ITEMS, args, 0)?;
                Invocation::GetAllItems
            }
            other => return Err(LedgerError::UnknownFunction(other.to_string())),
        };

        Ok(invocation)
    }

    /// Function name
    pub fn name(&self) -> &'static str {
        match self {
            Invocation::InitLedger => INIT_LEDGER,
            Invocation::CreateItem { .. } => CREATE_ITEM,
            Invocation::ReadItem { .. } => READ_ITEM,
            Invocation::UpdateItem { .. } => UPDATE_ITEM,
            Invocation::DeleteItem { .. } => DELETE_ITEM,
            Invocation::ItemExists { .. } => ITEM_EXISTS,
            Invocation::GetAllItems => GET_ALL_ITEMS,
        }
    }

    /// Queries never write to the world state
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            Invocation::ReadItem { .. } | Invocation::ItemExists { .. } | Invocation::GetAllItems
        )
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::CreateItem { id, .. }
            | Invocation::ReadItem { id }
            | Invocation::UpdateItem { id, .. }
            | Invocation::DeleteItem { id }
            | Invocation::ItemExists { id } => write!(f, "{}({})", self.name(), id),
            _ => write!(f, "{}()", self.name()),
        }
    }
}

fn expect_args(function: &str, args: &[String], expected: usize) -> LedgerResult<()> {
    if args.len() != expected {
        return Err(LedgerError::InvalidArgument(format!(
            "{} expects {} argument(s), got {}",
            function,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn parse_price(function: &str, raw: &str) -> LedgerResult<i64> {
    raw.trim().parse::<i64>().map_err(|e| {
        LedgerError::InvalidArgument(format!("{}: invalid price {:?}: {}", function, raw, e))
    })
}

impl ItemContract {
    /// Run an invocation and return its JSON response payload
    pub fn invoke(
        &self,
        ctx: &dyn TransactionContext,
        invocation: &Invocation,
    ) -> LedgerResult<Vec<u8>> {
        match invocation {
            Invocation::InitLedger => {
                self.init_ledger(ctx)?;
                Ok(Vec::new())
            }
            Invocation::CreateItem { id, name, price } => {
                self.create_item(ctx, id, name, *price)?;
                Ok(Vec::new())
            }
            Invocation::ReadItem { id } => Ok(serde_json::to_vec(&self.read_item(ctx, id)?)?),
            Invocation::UpdateItem { id, name, price } => {
                self.update_item(ctx, id, name, *price)?;
                Ok(Vec::new())
            }
            Invocation::DeleteItem { id } => {
                self.delete_item(ctx, id)?;
                Ok(Vec::new())
            }
            Invocation::ItemExists { id } => Ok(serde_json::to_vec(&self.item_exists(ctx, id)?)?),
            Invocation::GetAllItems => Ok(serde_json::to_vec(&self.get_all_items(ctx)?)?),
        }
    }

    /// Parse and run a named function
    pub fn invoke_function(
        &self,
        ctx: &dyn TransactionContext,
        function: &str,
        args: &[String],
    ) -> LedgerResult<Vec<u8>> {
        let invocation = Invocation::parse(function, args)?;
        self.invoke(ctx, &invocation)
    }
}
