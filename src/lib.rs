pub mod data;
pub mod error;
pub mod losses;
pub mod models;
pub mod modules;
pub mod utils;

pub use error::{Result, SurvivalError};
pub use losses::cox::{coxph_logparlk, coxph_logparlk_with_ties, CoxTies};
pub use losses::discrete::dsn_loss;
pub use losses::ranking::{acc_pairs, auc_jm, auc_pairs, c_index, concordance};
pub use models::ddh::model::{DynamicDeepHit, DynamicDeepHitConfig, DynamicDeepHitOutput};
