use crate::{
    config::RuntimeConfiguration,
    data::postgres::PgStudentSession,
    error::{GetDatabaseConnectionSnafu, MigrateSnafu, OpenDatabaseSnafu, RegistrarResult},
};
use maud::{DOCTYPE, Markup, html};
use snafu::ResultExt;
use sqlx::{Pool, Postgres, pool::PoolConnection, postgres::PgPoolOptions};

#[derive(Clone, Debug)]
pub struct RegistrarState {
    pool: Pool<Postgres>,
    config: RuntimeConfiguration,
}

impl RegistrarState {
    pub async fn new(options: PgPoolOptions, config: RuntimeConfiguration) -> RegistrarResult<Self> {
        let pool = options
            .connect(&config.db_config().get_db_path())
            .await
            .context(OpenDatabaseSnafu)?;

        sqlx::migrate!().run(&pool).await.context(MigrateSnafu)?;

        Ok(Self { pool, config })
    }

    #[allow(clippy::unused_self, clippy::needless_pass_by_value)] //in case self is ever needed :), and to allow direct html! usage
    pub fn render(&self, markup: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Registrar" }
                }
                body class="bg-gray-900 min-h-screen flex flex-col items-center text-white" {
                    (render_nav())
                    main class="w-full flex flex-col items-center p-4" {
                        (markup)
                    }
                }
            }
        }
    }

    pub const fn config(&self) -> &RuntimeConfiguration {
        &self.config
    }

    pub async fn get_connection(&self) -> RegistrarResult<PoolConnection<Postgres>> {
        self.pool
            .acquire()
            .await
            .context(GetDatabaseConnectionSnafu)
    }

    ///a fresh session for one request
    pub async fn student_session(&self) -> RegistrarResult<PgStudentSession> {
        Ok(PgStudentSession::new(self.get_connection().await?))
    }

    pub async fn sensible_shutdown(&self) {
        self.pool.close().await;
    }
}

fn render_nav() -> Markup {
    html! {
        nav class="w-full bg-gray-800 shadow-md mb-4" {
            div class="max-w-4xl mx-auto flex flex-row space-x-4 p-4" {
                a href="/" class="font-bold hover:text-blue-400" {"Registrar"}
                a href="/students" class="hover:text-blue-400" {"Students"}
                a href="/students/create" class="hover:text-blue-400" {"New Student"}
                a href="/about" class="hover:text-blue-400" {"About"}
            }
        }
    }
}
