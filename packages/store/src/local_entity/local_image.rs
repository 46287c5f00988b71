use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "local_images")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Blob")]
    pub image: Vec<u8>,

    /// Insertion time in epoch milliseconds; eviction scans this index.
    #[sea_orm(indexed)]
    pub timestamp: i64,
}

impl ActiveModelBehavior for ActiveModel {}
