//! Course attendance sheet.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::courses::MAX_TOTAL_LECTURES;
use crate::students::{AttendanceMark, Student};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub sr_no: usize,
    pub name: String,
    pub contact: String,
    pub attendance: BTreeMap<String, AttendanceMark>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceSheet {
    pub success: bool,
    /// `Lecture 1` through `Lecture N`
    pub lectures: Vec<String>,
    pub students: Vec<AttendanceRow>,
}

impl AttendanceSheet {
    /// Builds the sheet for `course_code` from its enrolled students.
    pub fn build(course_code: &str, total_lectures: i64, students: &[Student]) -> Self {
        let lectures = (1..=total_lectures.clamp(0, MAX_TOTAL_LECTURES))
            .map(|n| format!("Lecture {}", n))
            .collect();

        let students = students
            .iter()
            .enumerate()
            .map(|(index, student)| AttendanceRow {
                sr_no: index + 1,
                name: non_empty_or_na(&student.full_name),
                contact: non_empty_or_na(&student.phone),
                attendance: student
                    .enrollment_for(course_code)
                    .map(|e| e.attendance.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Self {
            success: true,
            lectures,
            students,
        }
    }
}

fn non_empty_or_na(value: &str) -> String {
    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::students::Enrollment;
    use chrono::{NaiveDate, Utc};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn student(name: &str, phone: &str, enrollments: Vec<Enrollment>) -> Student {
        let now = Utc::now();
        Student {
            id: Uuid::new_v4(),
            student_id: "S-1".into(),
            full_name: name.into(),
            date_of_birth: NaiveDate::from_ymd_opt(2004, 1, 1).unwrap(),
            gender: "Female".into(),
            phone: phone.into(),
            email: format!("{}@learnhub.dev", Uuid::new_v4()),
            password: "hash".into(),
            cnic_b_form: "3520212345671".into(),
            address: "Lahore".into(),
            csr: None,
            parent_guardian: Json(Default::default()),
            courses: Json(enrollments),
            emergency_contact: Json(Default::default()),
            photo: None,
            student_cnic_b_form: None,
            parent_cnic: None,
            medical_records: None,
            additional_documents: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_sheet_lists_lectures_and_rows() {
        let mut enrollment = Enrollment {
            selected_course: Some("WEB-101".into()),
            ..Default::default()
        };
        enrollment
            .attendance
            .insert("Lecture 1".into(), AttendanceMark::Present(true));

        let students = vec![
            student("Hira", "03001234567", vec![enrollment]),
            student("", "", vec![]),
        ];
        let sheet = AttendanceSheet::build("WEB-101", 3, &students);

        assert_eq!(sheet.lectures, vec!["Lecture 1", "Lecture 2", "Lecture 3"]);
        assert_eq!(sheet.students.len(), 2);
        assert_eq!(sheet.students[0].sr_no, 1);
        assert_eq!(
            sheet.students[0].attendance.get("Lecture 1"),
            Some(&AttendanceMark::Present(true))
        );
        assert_eq!(sheet.students[1].name, "N/A");
        assert!(sheet.students[1].attendance.is_empty());
    }

    #[test]
    fn test_zero_lectures() {
        let sheet = AttendanceSheet::build("WEB-101", 0, &[]);
        assert!(sheet.lectures.is_empty());
        assert!(sheet.students.is_empty());
    }

    #[test]
    fn test_lecture_columns_are_capped() {
        let sheet = AttendanceSheet::build("WEB-101", 5_000_000, &[]);
        assert_eq!(sheet.lectures.len(), MAX_TOTAL_LECTURES as usize);
        assert_eq!(sheet.lectures.last().map(String::as_str), Some("Lecture 1000"));
    }
}
