use crate::Session;

/// Grade and year selection for one discovery pass.
///
/// An empty list accepts everything. Grade terms match as substrings of the
/// inferred grade label; years must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    grades: Vec<String>,
    years: Vec<String>,
}

impl Filters {
    pub fn new<G, Y>(grades: G, years: Y) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
        Y: IntoIterator,
        Y::Item: Into<String>,
    {
        Self {
            grades: normalize(grades),
            years: normalize(years),
        }
    }

    pub fn accepts_grade(&self, grade: &str) -> bool {
        self.grades.is_empty() || self.grades.iter().any(|term| grade.contains(term.as_str()))
    }

    pub fn accepts_year(&self, year: Option<&str>) -> bool {
        if self.years.is_empty() {
            return true;
        }
        year.is_some_and(|year| self.years.iter().any(|wanted| wanted == year))
    }

    pub fn accepts(&self, session: &Session) -> bool {
        self.accepts_grade(&session.grade) && self.accepts_year(session.year.as_deref())
    }
}

fn normalize<I>(terms: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    terms
        .into_iter()
        .map(Into::into)
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty())
        .collect()
}
