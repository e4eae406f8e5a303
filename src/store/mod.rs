/// Store layer
///
/// Trait seams over the three persistence concerns (credentials, refresh
/// token revocation, search history), each with a production adapter and a
/// map-backed adapter for tests.
mod revocation;
mod search;
mod user;

pub use revocation::{InMemoryRevocationStore, RedisRevocationStore, RevocationStore};
pub use search::{
    InMemorySearchStore, NewSearch, PgSearchStore, RoutePoint, RouteSummary, SearchFilter,
    SearchRecord, SearchStats, SearchStore,
};
pub use user::{InMemoryUserStore, NewUser, PgUserStore, User, UserStore};
