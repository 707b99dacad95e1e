use crate::student::{NOT_AVAILABLE, Student};

/// Builds students for unit tests without going through the parser.
pub(crate) struct StudentBuilder {
    student: Student,
}

impl StudentBuilder {
    pub(crate) fn new() -> Self {
        Self {
            student: Student {
                course: "Engenharia".to_string(),
                status: "Regular".to_string(),
                gender: "M".to_string(),
                race_color: "Branca".to_string(),
                marital_status: NOT_AVAILABLE.to_string(),
                nationality: NOT_AVAILABLE.to_string(),
                entry_form: "Vestibular".to_string(),
                entry_category: NOT_AVAILABLE.to_string(),
                birth_date: "15-03-2000".to_string(),
                age: 25,
                entry_age: 22,
                origin: "SC - Florianópolis".to_string(),
                origin_state: "SC".to_string(),
                origin_city: "Florianópolis".to_string(),
                current_municipality: "Florianópolis".to_string(),
                current_state: "SC".to_string(),
                cumulative_index: 7500.0,
                passed_credits_index: 0.0,
                entry_year: 2023,
                entry_term: 1,
                entry_year_term: 20231,
                semesters_enrolled: 5,
            },
        }
    }

    pub(crate) fn course(mut self, value: &str) -> Self {
        self.student.course = value.to_string();
        self
    }

    pub(crate) fn gender(mut self, value: &str) -> Self {
        self.student.gender = value.to_string();
        self
    }

    pub(crate) fn race_color(mut self, value: &str) -> Self {
        self.student.race_color = value.to_string();
        self
    }

    pub(crate) fn current_municipality(mut self, value: &str) -> Self {
        self.student.current_municipality = value.to_string();
        self
    }

    pub(crate) fn current_state(mut self, value: &str) -> Self {
        self.student.current_state = value.to_string();
        self
    }

    pub(crate) fn age(mut self, age: i32) -> Self {
        self.student.age = age;
        self
    }

    pub(crate) fn entry_age(mut self, age: i32) -> Self {
        self.student.entry_age = age;
        self
    }

    pub(crate) fn semesters(mut self, semesters: i32) -> Self {
        self.student.semesters_enrolled = semesters;
        self
    }

    pub(crate) fn iaa(mut self, value: f64) -> Self {
        self.student.cumulative_index = value;
        self
    }

    pub(crate) fn iap(mut self, value: f64) -> Self {
        self.student.passed_credits_index = value;
        self
    }

    pub(crate) fn entry(mut self, year: i32, term: u8) -> Self {
        self.student.entry_year = year;
        self.student.entry_term = term;
        self.student.entry_year_term = year as u32 * 10 + u32::from(term);
        self
    }

    pub(crate) fn build(self) -> Student {
        self.student
    }
}
