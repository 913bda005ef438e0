use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub title: String,
    pub runtime: Option<i64>,
    pub budget: Option<String>,
    pub opening_weekend: Option<String>,
    pub worldwide_gross: Option<String>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub cover_url: Option<String>,
    pub cover_url_full: Option<String>,
    pub plot_outline: Option<String>,
    pub year: Option<i32>,
    pub plot: Option<String>,
    pub synopsis: Option<String>,
    pub locations: Option<String>,
    pub genres: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::personal::Entity")]
    Personal,
}

impl Related<super::personal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Personal.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
