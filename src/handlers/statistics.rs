use crate::{
    data::{StudentSession, enrollment::EnrollmentDateGroup},
    error::RegistrarResult,
};

#[derive(Debug)]
pub struct StatisticsPage {
    pub groups: Vec<EnrollmentDateGroup>,
}

pub struct EnrollmentStatisticsHandler<S> {
    session: S,
}

impl<S: StudentSession> EnrollmentStatisticsHandler<S> {
    pub const fn new(session: S) -> Self {
        Self { session }
    }

    ///one group per distinct enrollment date, in whatever order the store hands back
    pub async fn render_statistics(&mut self) -> RegistrarResult<StatisticsPage> {
        let groups = self.session.enrollment_date_groups().await?;
        Ok(StatisticsPage { groups })
    }
}
