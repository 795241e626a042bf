use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{Center, Course, Room, Student, Trainer, TrainingCourse, TrainingProgram};
use crate::upstream::{PortalApi, Resource, fetch_list, fetch_one};

#[derive(Debug, Clone, Serialize)]
pub struct CenterDetails {
    pub center: Center,
    pub students: Vec<Student>,
    pub trainers: Vec<Trainer>,
}

/// Typed reads over the reference data: centers, rooms, courses and programs.
pub struct CatalogService {
    api: Arc<dyn PortalApi>,
}

impl CatalogService {
    pub fn new(api: Arc<dyn PortalApi>) -> Self {
        Self { api }
    }

    /// A center with its students and trainers. The two rosters are fetched
    /// concurrently once the center itself is known to exist.
    pub async fn center_details(&self, token: &str, center_id: i64) -> Result<CenterDetails, AppError> {
        let api = self.api.as_ref();
        let center: Center = fetch_one(api, token, Resource::Centers, center_id).await?;

        let by_center = [("center".to_string(), center_id.to_string())];
        let (students, trainers) = tokio::try_join!(
            fetch_list::<Student>(api, token, Resource::Students, &by_center),
            fetch_list::<Trainer>(api, token, Resource::Trainers, &by_center),
        )?;
        info!(
            "center {}: {} students, {} trainers",
            center_id,
            students.len(),
            trainers.len()
        );

        Ok(CenterDetails {
            center,
            students,
            trainers,
        })
    }

    pub async fn room(&self, token: &str, room_id: i64) -> Result<Room, AppError> {
        fetch_one(self.api.as_ref(), token, Resource::Rooms, room_id).await
    }

    pub async fn courses(&self, token: &str) -> Result<Vec<Course>, AppError> {
        let mut courses: Vec<Course> =
            fetch_list(self.api.as_ref(), token, Resource::Courses, &[]).await?;
        courses.sort_by_key(|c| c.order);
        for course in &mut courses {
            course.sort_outline();
        }
        Ok(courses)
    }

    pub async fn course(&self, token: &str, course_id: i64) -> Result<Course, AppError> {
        let mut course: Course = fetch_one(self.api.as_ref(), token, Resource::Courses, course_id).await?;
        course.sort_outline();
        debug!("course {} has {} lessons", course.id, course.lesson_count());
        Ok(course)
    }

    pub async fn programs(&self, token: &str) -> Result<Vec<TrainingProgram>, AppError> {
        fetch_list(self.api.as_ref(), token, Resource::TrainingPrograms, &[]).await
    }

    /// Training courses, optionally narrowed to one program.
    pub async fn training_courses(
        &self,
        token: &str,
        program_id: Option<i64>,
    ) -> Result<Vec<TrainingCourse>, AppError> {
        let query: Vec<(String, String)> = program_id
            .map(|id| ("program".to_string(), id.to_string()))
            .into_iter()
            .collect();
        let courses: Vec<TrainingCourse> =
            fetch_list(self.api.as_ref(), token, Resource::TrainingCourses, &query).await?;
        Ok(match program_id {
            Some(id) => courses.into_iter().filter(|tc| tc.program.id == id).collect(),
            None => courses,
        })
    }
}
