use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "test_cases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub test_id: i64,
    #[sea_orm(belongs_to, from = "test_id", to = "id")]
    pub test: HasOne<super::test::Entity>,

    pub position: String,
    pub total_units_inspected: i32,

    pub case_damage_type: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub case_damage_description: Option<String>,
    /// Serialized image identifier (URL, `idb-<n>` or bare number).
    pub case_damage_image_url: Option<String>,

    #[sea_orm(has_many)]
    pub failures: HasMany<super::product_failure::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
