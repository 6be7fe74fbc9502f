//! Types that represent the core data model, such as `Transaction`, `Account` and the `Document`
//! that holds them all.
mod account;
mod amount;
mod card;
mod category;
pub(crate) mod de;
mod document;
mod kinds;
mod pending;
mod record;
mod recurring;
mod transaction;

pub use account::Account;
pub use amount::{Amount, AmountError};
pub use card::CreditCard;
pub use category::Category;
pub use document::{Document, DOCUMENT_VERSION};
pub use kinds::{AccountType, Flow, Frequency, PendingStatus};
pub use pending::PendingTransaction;
pub use record::{Record, Resource};
pub use recurring::RecurringTransaction;
pub use transaction::Transaction;
