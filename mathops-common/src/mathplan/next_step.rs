//! Next-step advice shown after a student completes the math plan
//!
//! The course recommendation logic produces a list of `NextStep` values; this
//! module turns each into plain-text advice. Wording depends on how many
//! prerequisites the student still needs before arrival, which courses fall in
//! the first semester, and the application term.

use crate::TermName;

/// A canned advice message or call to action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NextStep {
    Msg1aSingular,
    Msg1aPlural,
    Msg1bSingular,
    Msg1bPlural,
    Msg1cSingular,
    Msg1cPlural,
    Msg1dSingular,
    Msg1dPlural,
    Msg1eSingular,
    Msg1ePlural,
    Msg1fSingular,
    Msg1fPlural,
    Msg1g,
    Msg1h,
    Msg1i,
    Msg1j,
    Msg1k,
    Msg1lSingular,
    Msg1lPlural,
    Msg1mSingular,
    Msg1mPlural,
    Msg1n,
    Msg1o,
    Msg1p,
    Msg1q,
    Msg1r,
    Msg1sSingular,
    Msg1sPlural,
    Msg2a,
    Msg2b,
    Msg2c,
    Msg2d,
    Msg2e,
    Msg2f,
    Msg2g,
    Msg2h,
    Msg2i,
    Msg2j,
    Msg2k,
    Msg2l,
    Msg2m,
    Msg2n,
    Msg2o,
    Msg2p,
    Msg2q,
    Msg2r,
    Msg3a,
    Msg3b,
    Msg3c,
    Msg3d,
    Msg3e,
    Msg3f,
    Msg3g,
    Msg3h,
    Msg4a,
    Msg4b,
    Msg4c,
    ActMathPlacementExam,
    ActElmTutorial,
    ActPrecalculusTutorial,
    ActContactMyAdviser,
}

impl NextStep {
    /// True for the call-to-action steps
    pub fn is_action(self) -> bool {
        matches!(
            self,
            NextStep::ActMathPlacementExam
                | NextStep::ActElmTutorial
                | NextStep::ActPrecalculusTutorial
                | NextStep::ActContactMyAdviser
        )
    }

    /// Steps that mean no placement activity is required
    fn ends_placement(self) -> bool {
        matches!(
            self,
            NextStep::Msg3a | NextStep::Msg3g | NextStep::Msg3h | NextStep::Msg4a | NextStep::Msg4b | NextStep::Msg4c
        )
    }
}

/// How a message is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    /// Something the student must do
    Important,
    /// Advisory
    Recommended,
    /// Nothing left to do
    Complete,
    /// Button linking to more information
    Action,
}

/// Rendered advice for one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub emphasis: Emphasis,
    pub text: String,
    /// Link target, for action steps
    pub link: Option<String>,
}

impl Advice {
    fn new(emphasis: Emphasis, text: impl Into<String>) -> Self {
        Self {
            emphasis,
            text: text.into(),
            link: None,
        }
    }

    fn action(text: &str, link: impl Into<String>) -> Self {
        Self {
            emphasis: Emphasis::Action,
            text: text.to_string(),
            link: Some(link.into()),
        }
    }
}

/// Student facts the wording depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepContext {
    pub application_term: Option<TermName>,
    /// Prerequisites still needed before arrival for the critical sequence
    pub critical_prereqs: usize,
    /// Prerequisites still needed before arrival for the typical sequence
    pub typical_prereqs: usize,
    /// Labels of first-semester courses in the critical sequence, in order
    pub first_semester_courses: Vec<String>,
    /// True if MATH 101 is in the first semester of the critical sequence
    pub m101_first_semester: bool,
    pub adviser_email: Option<String>,
}

const MATH_117: &str = "MATH 117: College Algebra in Context I";
const ELM_TUTORIAL: &str = "Entry-Level Mathematics (ELM) Tutorial";
const REVIEW: &str = "Examples and practice materials are provided if you would like to review.";

impl StepContext {
    fn semester(&self) -> String {
        match self.application_term {
            Some(term) => format!("the {} semester", term.full_name()),
            None => "your first semester".to_string(),
        }
    }

    /// Fall and Spring admits attend Orientation before classes begin
    fn has_orientation(&self) -> bool {
        matches!(self.application_term, Some(TermName::Fall) | Some(TermName::Spring))
    }

    fn first_course(&self) -> String {
        self.first_semester_courses
            .first()
            .cloned()
            .unwrap_or_else(|| "your first course".to_string())
    }

    fn first_courses(&self) -> String {
        if self.first_semester_courses.is_empty() {
            "your first courses".to_string()
        } else {
            join_course_labels(&self.first_semester_courses)
        }
    }

    fn m101_or_first(&self) -> &'static str {
        if self.m101_first_semester {
            "MATH 101: Math in the Social Sciences"
        } else {
            "your first courses"
        }
    }

    fn m101_or_that(&self) -> &'static str {
        if self.m101_first_semester {
            "MATH 101"
        } else {
            "these courses"
        }
    }

    fn with_orientation(&self, text: String, sentence: &str) -> String {
        if self.has_orientation() {
            format!("{} {}", text, sentence)
        } else {
            text
        }
    }
}

fn pick(count: usize, one: &'static str, many: &'static str) -> &'static str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// "this prerequisite" / "these prerequisites"
fn these_prereqs(count: usize) -> &'static str {
    pick(count, "this prerequisite", "these prerequisites")
}

/// Sentence shared by the "courses whose prerequisites are not satisfied" family
fn unsatisfied(subject: &str, count: usize) -> String {
    format!(
        "{} {} not yet satisfied. You should try to satisfy {} as quickly as possible.",
        subject,
        pick(count, "prerequisite is", "prerequisites are"),
        these_prereqs(count)
    )
}

fn fastest_way(count: usize) -> String {
    format!(
        "The fastest way to satisfy {} is through Math Placement. {}",
        these_prereqs(count),
        REVIEW
    )
}

fn placement_opportunities(adverb: &str, count: usize) -> String {
    format!(
        "You {} have Math Placement opportunities to satisfy {}. {}",
        adverb,
        these_prereqs(count),
        REVIEW
    )
}

fn precalc_tutorial(also: bool, count: usize) -> String {
    format!(
        "You may {}complete {} of the Precalculus Tutorial to satisfy {}.",
        if also { "also " } else { "" },
        pick(count, "a section", "sections"),
        these_prereqs(count)
    )
}

fn elm_not_sufficient(count: usize, plural_courses: bool) -> String {
    format!(
        "You may complete the {} to allow you to register for {}, but this will NOT satisfy the {} for your \
         first-semester {}.",
        ELM_TUTORIAL,
        MATH_117,
        pick(count, "prerequisite", "prerequisites"),
        if plural_courses { "courses" } else { "course" }
    )
}

fn speak_with_adviser(plural_courses: bool) -> String {
    format!(
        "You should speak with your adviser (if you have been assigned an adviser), or to the Department of \
         Mathematics (if not) about your options to satisfy the prerequisites for your first-semester mathematics \
         {}.",
        if plural_courses { "courses" } else { "course" }
    )
}

/// Advice for one step
///
/// Action steps return `None` unless `show_actions` is set.
pub fn advice(step: NextStep, ctx: &StepContext, show_actions: bool) -> Option<Advice> {
    use Emphasis::{Complete, Important, Recommended};

    let crit = ctx.critical_prereqs;
    let typ = ctx.typical_prereqs;
    let semester = ctx.semester();

    let result = match step {
        NextStep::Msg1aSingular => {
            let text = format!(
                "It is important that you satisfy the {} for {} before {}.",
                pick(crit, "prerequisite", "prerequisites"),
                ctx.first_course(),
                semester
            );
            Advice::new(
                Important,
                ctx.with_orientation(text, "Ideally, you will do this in time to register for this course during Orientation."),
            )
        }
        NextStep::Msg1aPlural => {
            let text = format!(
                "It is important that you satisfy the {} for {} before {}.",
                pick(crit, "prerequisite", "prerequisites"),
                ctx.first_courses(),
                semester
            );
            Advice::new(
                Important,
                ctx.with_orientation(text, "Ideally, you will do this in time to register for these courses during Orientation."),
            )
        }
        NextStep::Msg1bSingular => Advice::new(
            Important,
            unsatisfied("There is a course important to your program whose", crit),
        ),
        NextStep::Msg1bPlural => Advice::new(
            Important,
            unsatisfied("There are courses important to your program whose", crit),
        ),
        NextStep::Msg1cSingular => {
            let text = format!(
                "We recommend that you satisfy the {} for your first-semester course so you can take that course \
                 during {}, if space permits.",
                pick(typ, "prerequisite", "prerequisites"),
                semester
            );
            Advice::new(
                Recommended,
                ctx.with_orientation(text, "Ideally, you will register for this course during Orientation."),
            )
        }
        NextStep::Msg1cPlural => {
            let text = format!(
                "We recommend that you satisfy the {} for your first-semester courses so you can take those courses \
                 during {}, if space permits.",
                pick(typ, "prerequisite", "prerequisites"),
                semester
            );
            Advice::new(
                Recommended,
                ctx.with_orientation(text, "Ideally, you will register for those courses during Orientation."),
            )
        }
        NextStep::Msg1dSingular => Advice::new(
            Recommended,
            format!(
                "A course that is recommended for your program has {} not yet satisfied. You should try to satisfy \
                 {} as quickly as possible.",
                pick(typ, "a prerequisite that is", "prerequisites that are"),
                these_prereqs(typ)
            ),
        ),
        NextStep::Msg1dPlural => Advice::new(
            Recommended,
            unsatisfied("There are courses recommended for your program whose", typ),
        ),
        NextStep::Msg1eSingular => Advice::new(
            Recommended,
            format!(
                "Satisfying the {} for your first-semester course would allow you to take that course during {}, \
                 if space permits.",
                pick(typ, "prerequisite", "prerequisites"),
                semester
            ),
        ),
        NextStep::Msg1ePlural => Advice::new(
            Recommended,
            format!(
                "Satisfying the {} of your first-semester courses would allow you to take those courses during {}, \
                 if space permits.",
                pick(typ, "prerequisite", "prerequisites"),
                semester
            ),
        ),
        NextStep::Msg1fSingular => Advice::new(
            Recommended,
            unsatisfied("There is a course in your program whose", typ),
        ),
        NextStep::Msg1fPlural => Advice::new(
            Recommended,
            unsatisfied("There are courses in your program whose", typ),
        ),
        NextStep::Msg1g => Advice::new(Recommended, fastest_way(crit)),
        NextStep::Msg1h => Advice::new(Recommended, placement_opportunities("still", crit)),
        NextStep::Msg1i => Advice::new(Recommended, precalc_tutorial(true, crit)),
        NextStep::Msg1j => Advice::new(Recommended, precalc_tutorial(false, crit)),
        NextStep::Msg1k => Advice::new(Recommended, placement_opportunities("also", crit)),
        NextStep::Msg1lSingular => Advice::new(Recommended, elm_not_sufficient(crit, false)),
        NextStep::Msg1lPlural => Advice::new(Recommended, elm_not_sufficient(crit, true)),
        NextStep::Msg1mSingular => Advice::new(Important, speak_with_adviser(false)),
        NextStep::Msg1mPlural => Advice::new(Important, speak_with_adviser(true)),
        NextStep::Msg1n => Advice::new(Recommended, fastest_way(typ)),
        NextStep::Msg1o => Advice::new(Recommended, placement_opportunities("still", typ)),
        NextStep::Msg1p => Advice::new(Recommended, precalc_tutorial(true, typ)),
        NextStep::Msg1q => Advice::new(Recommended, precalc_tutorial(false, typ)),
        NextStep::Msg1r => Advice::new(Recommended, placement_opportunities("also", typ)),
        NextStep::Msg1sSingular => Advice::new(Recommended, elm_not_sufficient(typ, false)),
        NextStep::Msg1sPlural => Advice::new(Recommended, elm_not_sufficient(typ, true)),

        NextStep::Msg2a => Advice::new(
            Important,
            ctx.with_orientation(
                format!("It is important that you take {} during {}.", MATH_117, semester),
                "Ideally, you will register for this course during Orientation.",
            ),
        ),
        NextStep::Msg2b => Advice::new(
            Recommended,
            ctx.with_orientation(
                format!("We recommend that you take {} during {}.", MATH_117, semester),
                "Ideally, you will register for this course during Orientation.",
            ),
        ),
        NextStep::Msg2c => {
            let text = format!(
                "If you would like to take {} during {}, you should try to become eligible for that course in time \
                 to register before classes begin",
                MATH_117, semester
            );
            let text = if ctx.has_orientation() {
                format!("{} (ideally during Orientation).", text)
            } else {
                format!("{}.", text)
            };
            Advice::new(Recommended, text)
        }
        NextStep::Msg2d => Advice::new(
            Important,
            ctx.with_orientation(
                format!("It is important that you take {} during {}.", ctx.m101_or_first(), semester),
                "Ideally, you will register for this course during Orientation.",
            ),
        ),
        NextStep::Msg2e => Advice::new(
            Recommended,
            ctx.with_orientation(
                format!("We recommend that you take {} during {}.", ctx.m101_or_first(), semester),
                "Ideally, you will register for this course during Orientation.",
            ),
        ),
        NextStep::Msg2f => Advice::new(
            Important,
            format!("It is important that you take {} as quickly as possible.", MATH_117),
        ),
        NextStep::Msg2g | NextStep::Msg2h => Advice::new(
            Recommended,
            format!("We recommend that you take {} as quickly as possible.", MATH_117),
        ),
        NextStep::Msg2i => Advice::new(
            Important,
            format!("It is important that you take {} as quickly as possible.", ctx.m101_or_first()),
        ),
        NextStep::Msg2j => Advice::new(
            Recommended,
            format!("We recommend that you take {} as quickly as possible.", ctx.m101_or_first()),
        ),
        NextStep::Msg2k => Advice::new(
            Recommended,
            format!("The fastest way to become eligible for MATH 117 is through Math Placement. {}", REVIEW),
        ),
        NextStep::Msg2l => Advice::new(
            Recommended,
            "You only need to complete the Algebra portion of Math Placement to become eligible for MATH 117, but \
             completing as much as you can may give you more options in case you change majors.",
        ),
        NextStep::Msg2m => Advice::new(
            Recommended,
            format!("You still have Math Placement opportunities to become eligible for MATH 117. {}", REVIEW),
        ),
        NextStep::Msg2n => Advice::new(
            Recommended,
            format!("You can also become eligible for MATH 117 by completing the {}.", ELM_TUTORIAL),
        ),
        NextStep::Msg2o => Advice::new(
            Recommended,
            format!("You can become eligible for MATH 117 by completing the {}.", ELM_TUTORIAL),
        ),
        NextStep::Msg2p => Advice::new(
            Recommended,
            format!("You also have Math Placement opportunities to become eligible for MATH 117. {}", REVIEW),
        ),
        NextStep::Msg2q => Advice::new(
            Recommended,
            format!("You can become eligible for {} through Math Placement.", ctx.m101_or_that()),
        ),
        NextStep::Msg2r => Advice::new(
            Recommended,
            format!(
                "You only need to complete the Algebra portion of Math Placement to become eligible for {}, but \
                 completing as much as you can may give you more options in case you change majors.",
                ctx.m101_or_that()
            ),
        ),

        NextStep::Msg3a | NextStep::Msg4a => Advice::new(Complete, "No further action is needed."),
        NextStep::Msg3b => Advice::new(
            Recommended,
            "We recommend that you complete the required three credits of Core Curriculum mathematics within your \
             first thirty credit hours.",
        ),
        NextStep::Msg3c => Advice::new(
            Recommended,
            "If you decide to pursue a major that requires College Algebra or other Precalculus or Calculus courses, \
             you can go through Math Placement or complete a tutorial to become eligible for those mathematics \
             courses.",
        ),
        NextStep::Msg3d => Advice::new(
            Recommended,
            format!(
                "You are eligible to take the Math Challenge Exam. With this exam, you can attempt to earn credit in \
                 one or more of your required courses. {}",
                REVIEW
            ),
        ),
        NextStep::Msg3e => Advice::new(
            Recommended,
            format!("You can attempt to place out of one or more courses through Math Placement. {}", REVIEW),
        ),
        NextStep::Msg3f => Advice::new(
            Recommended,
            format!(
                "You still have Math Placement opportunities that could be used to place out of one or more courses. {}",
                REVIEW
            ),
        ),
        NextStep::Msg3g | NextStep::Msg4b => {
            Advice::new(Recommended, "You do not need to complete the Math Placement process.")
        }
        NextStep::Msg3h => Advice::new(
            Recommended,
            "You do not need to complete the Math Placement process unless you plan to take a math course other \
             than MATH 101, MATH 105, STAT 100, STAT 201, or STAT 204.",
        ),
        NextStep::Msg4c => Advice::new(
            Recommended,
            "Your existing course credit satisfies the requirements of your selected major(s) of interest.",
        ),

        NextStep::ActMathPlacementExam
        | NextStep::ActElmTutorial
        | NextStep::ActPrecalculusTutorial
        | NextStep::ActContactMyAdviser
            if !show_actions =>
        {
            return None;
        }
        NextStep::ActMathPlacementExam => Advice::action("Tell me about Math Placement...", "placement_process.html"),
        NextStep::ActElmTutorial => Advice::action("Tell me about the ELM Tutorial...", "elm.html"),
        NextStep::ActPrecalculusTutorial => {
            Advice::action("Tell me about the Precalculus Tutorial...", "precalc.html")
        }
        NextStep::ActContactMyAdviser => match &ctx.adviser_email {
            Some(email) => Advice::action("Contact my adviser...", format!("mailto:{}", email)),
            None => Advice::action("Contact my adviser...", "contact_adviser.html"),
        },
    };

    Some(result)
}

/// Advice for each step in order, skipping actions unless `show_actions`
pub fn advice_list(steps: &[NextStep], ctx: &StepContext, show_actions: bool) -> Vec<Advice> {
    steps
        .iter()
        .filter_map(|step| advice(*step, ctx, show_actions))
        .collect()
}

/// False when there are no steps or any step says placement is unnecessary
pub fn needs_placement(steps: &[NextStep]) -> bool {
    !steps.is_empty() && !steps.iter().any(|step| step.ends_placement())
}

/// "A", "A and B", "A, B, and C"
pub fn join_course_labels<S: AsRef<str>>(labels: &[S]) -> String {
    match labels {
        [] => String::new(),
        [one] => one.as_ref().to_string(),
        [first, second] => format!("{} and {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{}, and {}", head.join(", "), last.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> StepContext {
        StepContext {
            application_term: Some(TermName::Fall),
            critical_prereqs: 1,
            typical_prereqs: 2,
            first_semester_courses: vec!["MATH 124".to_string(), "MATH 125".to_string()],
            m101_first_semester: false,
            adviser_email: None,
        }
    }

    #[test]
    fn test_join_course_labels() {
        assert_eq!(join_course_labels::<&str>(&[]), "");
        assert_eq!(join_course_labels(&["A"]), "A");
        assert_eq!(join_course_labels(&["A", "B"]), "A and B");
        assert_eq!(join_course_labels(&["A", "B", "C"]), "A, B, and C");
    }

    #[test]
    fn test_needs_placement() {
        assert!(!needs_placement(&[]));
        assert!(needs_placement(&[NextStep::Msg1aSingular, NextStep::ActMathPlacementExam]));
        assert!(!needs_placement(&[NextStep::Msg2b, NextStep::Msg3h]));
        assert!(!needs_placement(&[NextStep::Msg4c]));
    }

    #[test]
    fn test_singular_and_plural_wording() {
        let c = ctx();
        let crit = advice(NextStep::Msg1g, &c, false).unwrap();
        assert!(crit.text.starts_with("The fastest way to satisfy this prerequisite"));

        let typ = advice(NextStep::Msg1n, &c, false).unwrap();
        assert!(typ.text.starts_with("The fastest way to satisfy these prerequisites"));

        let plural = advice(NextStep::Msg1aPlural, &c, false).unwrap();
        assert_eq!(plural.emphasis, Emphasis::Important);
        assert!(plural.text.contains("MATH 124 and MATH 125"));
        assert!(plural.text.contains("the Fall semester"));
    }

    #[test]
    fn test_orientation_sentence_only_for_fall_and_spring() {
        let mut c = ctx();
        assert!(advice(NextStep::Msg2a, &c, false).unwrap().text.contains("Orientation"));

        c.application_term = Some(TermName::Summer);
        let summer = advice(NextStep::Msg2a, &c, false).unwrap();
        assert!(!summer.text.contains("Orientation"));
        assert!(summer.text.contains("the Summer semester"));

        c.application_term = None;
        assert!(advice(NextStep::Msg2c, &c, false).unwrap().text.contains("your first semester"));
    }

    #[test]
    fn test_actions_only_when_requested() {
        let mut c = ctx();
        assert_eq!(advice(NextStep::ActElmTutorial, &c, false), None);

        let elm = advice(NextStep::ActElmTutorial, &c, true).unwrap();
        assert_eq!(elm.link.as_deref(), Some("elm.html"));

        let contact = advice(NextStep::ActContactMyAdviser, &c, true).unwrap();
        assert_eq!(contact.link.as_deref(), Some("contact_adviser.html"));

        c.adviser_email = Some("adviser@example.edu".to_string());
        let contact = advice(NextStep::ActContactMyAdviser, &c, true).unwrap();
        assert_eq!(contact.link.as_deref(), Some("mailto:adviser@example.edu"));

        let list = advice_list(&[NextStep::Msg3a, NextStep::ActMathPlacementExam], &c, false);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].emphasis, Emphasis::Complete);
    }

    #[test]
    fn test_m101_phrasing() {
        let mut c = ctx();
        assert!(advice(NextStep::Msg2q, &c, false).unwrap().text.contains("these courses"));
        c.m101_first_semester = true;
        assert!(advice(NextStep::Msg2q, &c, false).unwrap().text.contains("MATH 101 through"));
    }
}
