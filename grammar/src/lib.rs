//! Grammar declarations: symbols, productions with precedence, LR(0) items,
//! and the FIRST/FOLLOW sets computed over them.

mod error;
mod grammar;
mod item;
mod production;
mod symbol;

pub use self::error::GrammarError;
pub use self::grammar::{FirstSet, Grammar, AUGMENTED_START};
pub use self::item::{ItemId, LrItem};
pub use self::production::{Assoc, Precedence, Production};
pub use self::symbol::{is_nonterminal_name, is_token_name, Symbol, END, ERROR};

pub type Map<K, V> = indexmap::IndexMap<K, V, fnv::FnvBuildHasher>;
pub type Set<K> = indexmap::IndexSet<K, fnv::FnvBuildHasher>;
