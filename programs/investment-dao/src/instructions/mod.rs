pub mod claim;
pub mod create_dao;
pub mod deposit;
pub mod execute;
pub mod membership;
pub mod proposal;

pub use claim::*;
pub use create_dao::*;
pub use deposit::*;
pub use execute::*;
pub use membership::*;
pub use proposal::*;

use anchor_lang::prelude::*;

use crate::error::DaoError;
use crate::math;

/// Lamports held above the account's rent-exempt reserve.
pub fn spendable(account: &AccountInfo) -> Result<u64> {
    let reserve = Rent::get()?.minimum_balance(account.data_len());
    Ok(account.lamports().saturating_sub(reserve))
}

/// Moves lamports out of a program-owned account without touching its rent
/// reserve. `shortfall` is reported when the spendable balance is too low.
pub fn move_lamports<'info>(
    from: &AccountInfo<'info>,
    to: &AccountInfo<'info>,
    amount: u64,
    shortfall: DaoError,
) -> Result<()> {
    if spendable(from)? < amount {
        return Err(shortfall.into());
    }
    let debited = math::sub(from.lamports(), amount)?;
    let credited = math::add(to.lamports(), amount)?;
    **from.try_borrow_mut_lamports()? = debited;
    **to.try_borrow_mut_lamports()? = credited;
    Ok(())
}
