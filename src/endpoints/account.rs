// Account summary for the Vultr API key in use.

use crate::error::Result;
use crate::format::{format_currency, utc_str_to_local};
use crate::models::{decode, Account};
use crate::output::kv_table;

use super::Context;

/// Print the account owner, balance and last payment.
pub fn show(ctx: &Context) -> Result<()> {
    let Some(data) = ctx.vultr_get("account")? else {
        return Ok(());
    };
    let account: Account = decode(&data, "account")?;
    println!("{}", kv_table(rows(&account)));
    Ok(())
}

fn rows(account: &Account) -> Vec<(&'static str, String)> {
    vec![
        ("Name", account.name.clone()),
        ("Email", account.email.clone()),
        ("Balance", format_currency(&account.balance)),
        ("Pending Charges", format_currency(&account.pending_charges)),
        ("Last Payment Date", utc_str_to_local(&account.last_payment_date)),
        ("Last Payment Amount", format_currency(&account.last_payment_amount)),
    ]
}
