use sea_orm_migration::{prelude::*, schema::*};

/// Person link tables, one per credited role.
const ROLE_TABLES: [&str; 6] =
    ["moviecast", "director", "producer", "writer", "composer", "cinematographer"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(big_integer(Movie::Id).primary_key())
                    .col(string(Movie::Title))
                    .col(big_integer_null(Movie::Runtime))
                    .col(string_null(Movie::Budget))
                    .col(string_null(Movie::OpeningWeekend))
                    .col(string_null(Movie::WorldwideGross))
                    .col(double_null(Movie::Rating))
                    .col(big_integer_null(Movie::Votes))
                    .col(string_null(Movie::CoverUrl))
                    .col(string_null(Movie::CoverUrlFull))
                    .col(text_null(Movie::PlotOutline))
                    .col(integer_null(Movie::Year))
                    .col(text_null(Movie::Plot))
                    .col(text_null(Movie::Synopsis))
                    .col(string_null(Movie::Locations))
                    .col(string(Movie::Genres))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Person::Table)
                    .if_not_exists()
                    .col(big_integer(Person::Id).primary_key())
                    .col(string(Person::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(big_integer(Company::Id).primary_key())
                    .col(string(Company::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Personal::Table)
                    .if_not_exists()
                    .col(big_integer(Personal::Id).primary_key())
                    .col(big_integer(Personal::MovieId))
                    .col(string(Personal::WatchDate))
                    .col(double(Personal::Rating))
                    .col(string(Personal::Method))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_personal_movie")
                            .from(Personal::Table, Personal::MovieId)
                            .to(Movie::Table, Movie::Id),
                    )
                    .to_owned(),
            )
            .await?;

        for table in ROLE_TABLES {
            create_link_table(manager, table, "person_id", Person::Table, Person::Id).await?;
        }
        create_link_table(
            manager,
            "production_company",
            "company_id",
            Company::Table,
            Company::Id,
        )
        .await?;

        manager
            .create_table(
                Table::create()
                    .table(LocalSequence::Table)
                    .if_not_exists()
                    .col(string(LocalSequence::TableName).primary_key())
                    .col(big_integer(LocalSequence::LastId))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(LocalSequence::Table).to_owned()).await?;
        for table in ROLE_TABLES.into_iter().chain(["production_company"]) {
            manager.drop_table(Table::drop().table(Alias::new(table)).to_owned()).await?;
        }
        manager.drop_table(Table::drop().table(Personal::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Company::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Person::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        Ok(())
    }
}

async fn create_link_table<P, T>(
    manager: &SchemaManager<'_>,
    name: &str,
    target: &str,
    parent: P,
    parent_id: T,
) -> Result<(), DbErr>
where
    P: IntoIden + 'static,
    T: IntoIden + 'static,
{
    manager
        .create_table(
            Table::create()
                .table(Alias::new(name))
                .if_not_exists()
                .col(big_integer(Link::Id).primary_key())
                .col(big_integer(Link::MovieId))
                .col(big_integer(Alias::new(target)))
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_movie"))
                        .from(Alias::new(name), Link::MovieId)
                        .to(Movie::Table, Movie::Id),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name(format!("fk_{name}_{target}"))
                        .from(Alias::new(name), Alias::new(target))
                        .to(parent, parent_id),
                )
                .to_owned(),
        )
        .await?;

    manager
        .create_index(
            Index::create()
                .name(format!("idx_{name}_movie"))
                .table(Alias::new(name))
                .col(Link::MovieId)
                .to_owned(),
        )
        .await?;

    Ok(())
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    Title,
    Runtime,
    Budget,
    OpeningWeekend,
    WorldwideGross,
    Rating,
    Votes,
    CoverUrl,
    CoverUrlFull,
    PlotOutline,
    Year,
    Plot,
    Synopsis,
    Locations,
    Genres,
}

#[derive(DeriveIden)]
enum Person {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Company {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Personal {
    Table,
    Id,
    MovieId,
    WatchDate,
    Rating,
    Method,
}

#[derive(DeriveIden)]
enum Link {
    Id,
    MovieId,
}

#[derive(DeriveIden)]
enum LocalSequence {
    Table,
    TableName,
    LastId,
}
