use crate::{
    error::RegistrarResult,
    handlers::statistics::{EnrollmentStatisticsHandler, StatisticsPage},
    maud_conveniences::render_table,
    state::RegistrarState,
};
use axum::extract::State;
use maud::{Markup, html};

pub fn render_statistics(StatisticsPage { groups }: StatisticsPage) -> Markup {
    let rows = groups
        .into_iter()
        .map(|group| {
            [
                html! {(group.enrollment_date.format("%d %B %Y").to_string())},
                html! {(group.student_count)},
            ]
        })
        .collect();

    html! {
        div class="mx-auto bg-gray-800 p-8 rounded shadow-md max-w-4xl w-full flex flex-col space-y-4" {
            (render_table(
                "Student Body Statistics",
                [html! {"Enrollment Date"}, html! {"Students"}],
                rows,
            ))
        }
    }
}

pub async fn get_about(State(state): State<RegistrarState>) -> RegistrarResult<Markup> {
    let page = EnrollmentStatisticsHandler::new(state.student_session().await?)
        .render_statistics()
        .await?;
    Ok(state.render(render_statistics(page)))
}
