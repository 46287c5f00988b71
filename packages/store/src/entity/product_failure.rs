use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_failures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Remote-assigned id of the owning case.
    #[sea_orm(indexed)]
    pub case_id: i32,
    #[sea_orm(belongs_to, from = "case_id", to = "id")]
    pub case: HasOne<super::test_case::Entity>,

    pub failure_mode: String,
    pub units_failed: i32,
    pub image_url: Option<String>,
}

impl ActiveModelBehavior for ActiveModel {}
