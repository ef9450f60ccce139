// Crate-internal.
// ---

pub(crate) mod data {
    pub(crate) mod datasources {
        pub(crate) mod config_ron_datasource;
        pub(crate) mod ledger_snapshot_datasource;
        pub(crate) mod transactions_csv_datasource;
    }
    pub(crate) mod models {
        pub(crate) mod amount_model;
        pub(crate) mod config_model;
        pub(crate) mod iso_date_model;
    }
    pub(crate) mod repositories {
        pub(crate) mod in_memory_records_repository;
    }
}

pub(crate) mod domain {
    pub(crate) mod entities {
        pub(crate) mod allocation;
        pub(crate) mod anomaly;
        pub(crate) mod audit_log;
        pub(crate) mod budget;
        pub(crate) mod config;
        pub(crate) mod ids;
        pub(crate) mod ledger;
        pub(crate) mod transaction;
    }
    pub(crate) mod logic {
        pub(crate) mod aggregation;
        pub(crate) mod anomaly_detector;
        pub(crate) mod fuzzy_search;
        pub(crate) mod hash_chain;
        pub(crate) mod ledger_recorder;
        pub(crate) mod similarity;
        pub(crate) mod utils;
    }
    pub(crate) mod repositories {
        pub(crate) mod records_repository;
    }
    pub(crate) mod usecases {
        pub(crate) mod anomaly_usecase;
        pub(crate) mod transaction_usecase;
    }
}

pub(crate) mod presentation {
    pub(crate) mod anomaly_fmt;
    pub(crate) mod report_printer;
    pub(crate) mod utils;
}

// Public exports.
// ---

#[doc(hidden)]
#[allow(unused_imports)]
pub mod exports {
    // This mod represents how clients see the library, and can differ from the
    // internal structure.
    //
    // The contents of this mod are re-exported in the root of the crate.

    pub mod entities {
        pub use crate::domain::entities::allocation::*;
        pub use crate::domain::entities::anomaly::*;
        pub use crate::domain::entities::audit_log::*;
        pub use crate::domain::entities::budget::*;
        pub use crate::domain::entities::config::*;
        pub use crate::domain::entities::ids::*;
        pub use crate::domain::entities::ledger::*;
        pub use crate::domain::entities::transaction::*;
    }

    pub mod repositories {
        pub use crate::data::repositories::in_memory_records_repository::InMemoryRecordsRepository;
        pub use crate::domain::repositories::records_repository::*;
    }
}
