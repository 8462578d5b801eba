use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub creator_address: String,
    pub funding_goal: i64,
    pub raised_amount: i64,
    pub votes_for: i64,
    pub votes_against: i64,
    /// Days the proposal stays open after creation
    pub duration: i32,
    pub created_at: DateTimeWithTimeZone,
    pub approved: bool,
    pub metis_impact_score: f64,
    pub energy_efficiency: i32,
    pub community_benefit: i32,
    pub innovation_factor: i32,
    pub token_stake: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::vote::Entity")]
    Vote,
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
