//! Report schema: the ordered column layout of one report.
//!
//! A schema is composed once per report target from the resolved
//! assessment, scoring dimension and custom field groups. Every column
//! carries a [`ColumnSource`] telling the row assembler where its value
//! comes from, so header and rows are produced from the same list and
//! cannot drift apart.

use super::{
    Assessment, AssessmentId, CustomField, CustomFieldId, ReportDomainError, ScoringDimension,
    ScoringDimensionId,
};
use std::collections::{HashMap, HashSet};

/// Suffix distinguishing non-pipeline columns from pipeline ones.
pub const NON_PIPELINE_SUFFIX: &str = "_non_pipeline";

/// Columns present in every report, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedColumn {
    /// `e_users.id`.
    UserId,
    /// `e_users.last_name`.
    UserLastName,
    /// `e_users.first_name`.
    UserFirstName,
    /// `e_users.email`.
    UserEmail,
    /// `e_users.country_code`.
    UserCountryCode,
    /// `e_users.phone`.
    UserPhone,
    /// `e_candidacies.id`.
    CandidacyId,
    /// `e_candidacies.created_at`.
    CandidacyCreatedAt,
    /// `e_pipeline_stages.name`.
    CandidacyPipelineStage,
    /// `e_candidacies.status`.
    CandidacyStatus,
    /// `e_candidacies.failed`.
    CandidacyFailed,
    /// Name of the candidacy's job.
    JobName,
    /// Candidacy tag names.
    Tags,
    /// `e_candidacies.percentile`.
    Percentile,
    /// `e_candidacies.weighted_percentage_score`.
    WeightedPercentageScore,
    /// `e_candidacies.remaining_assessment_count`.
    AssessmentsRemaining,
    /// Count of the user's completed assessments.
    AssessmentsCompleted,
    /// Elapsed whole seconds since the candidacy was created.
    HoursSinceApplication,
    /// Email event count.
    EmailMessagesCount,
    /// SMS event count.
    SmsMessagesCount,
    /// Creation time of the first email event.
    LastEmailCreatedAt,
    /// Creation time of the first SMS event.
    LastSmsCreatedAt,
    /// Start of the earliest calendar event.
    CalendarEvents,
}

impl FixedColumn {
    /// Every fixed column in output order.
    pub const ALL: [Self; 23] = [
        Self::UserId,
        Self::UserLastName,
        Self::UserFirstName,
        Self::UserEmail,
        Self::UserCountryCode,
        Self::UserPhone,
        Self::CandidacyId,
        Self::CandidacyCreatedAt,
        Self::CandidacyPipelineStage,
        Self::CandidacyStatus,
        Self::CandidacyFailed,
        Self::JobName,
        Self::Tags,
        Self::Percentile,
        Self::WeightedPercentageScore,
        Self::AssessmentsRemaining,
        Self::AssessmentsCompleted,
        Self::HoursSinceApplication,
        Self::EmailMessagesCount,
        Self::SmsMessagesCount,
        Self::LastEmailCreatedAt,
        Self::LastSmsCreatedAt,
        Self::CalendarEvents,
    ];

    /// Header text of the column.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::UserId => "user_id",
            Self::UserLastName => "user_last_name",
            Self::UserFirstName => "user_first_name",
            Self::UserEmail => "user_email",
            Self::UserCountryCode => "user_country_code",
            Self::UserPhone => "user_phone",
            Self::CandidacyId => "candidacy_id",
            Self::CandidacyCreatedAt => "candidacy_created_at",
            Self::CandidacyPipelineStage => "candidacy_pipeline_stage",
            Self::CandidacyStatus => "candidacy_status",
            Self::CandidacyFailed => "candidacy_failed",
            Self::JobName => "job_name",
            Self::Tags => "tags",
            Self::Percentile => "percentile",
            Self::WeightedPercentageScore => "weighted_percentage_score",
            Self::AssessmentsRemaining => "assessments_remaining",
            Self::AssessmentsCompleted => "assessments_completed",
            Self::HoursSinceApplication => "hours_since_application",
            Self::EmailMessagesCount => "email_messages_count",
            Self::SmsMessagesCount => "sms_messages_count",
            Self::LastEmailCreatedAt => "last_email_created_at",
            Self::LastSmsCreatedAt => "last_sms_created_at",
            Self::CalendarEvents => "calendar_events",
        }
    }
}

/// Per-assessment sub-columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssessmentMetric {
    /// The user's percentage score on the assessment.
    Percentage,
    /// The candidacy's overall percentile.
    Percentile,
    /// The candidacy's raw score.
    Score,
    /// When the user started the assessment.
    StartedAt,
    /// When the user completed the assessment.
    CompletedAt,
}

impl AssessmentMetric {
    /// Sub-columns in output order.
    pub const ALL: [Self; 5] = [
        Self::Percentage,
        Self::Percentile,
        Self::Score,
        Self::StartedAt,
        Self::CompletedAt,
    ];

    const fn suffix(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Percentile => "percentile",
            Self::Score => "score",
            Self::StartedAt => "started_at",
            Self::CompletedAt => "completed_at",
        }
    }
}

/// Per-scoring-dimension sub-columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionMetric {
    /// The candidacy's rating on the dimension.
    Percentage,
    /// The candidacy's overall percentile.
    Percentile,
}

impl DimensionMetric {
    /// Sub-columns in output order.
    pub const ALL: [Self; 2] = [Self::Percentage, Self::Percentile];

    const fn suffix(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Percentile => "percentile",
        }
    }
}

/// Column group a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnGroup {
    /// Fixed candidacy columns.
    Fixed,
    /// Assessments attached to the job's pipeline.
    PipelineAssessment,
    /// Scoring dimensions of pipeline assessments.
    PipelineDimension,
    /// Assessments taken by candidates outside the pipeline.
    NonPipelineAssessment,
    /// Scoring dimensions of non-pipeline assessments.
    NonPipelineDimension,
    /// Organization custom fields.
    CustomField,
}

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSource {
    /// A fixed column.
    Fixed(FixedColumn),
    /// One metric of an assessment result.
    Assessment {
        /// Assessment looked up.
        assessment_id: AssessmentId,
        /// Metric rendered.
        metric: AssessmentMetric,
    },
    /// One metric of a scoring dimension rating.
    Dimension {
        /// Dimension looked up.
        scoring_dimension_id: ScoringDimensionId,
        /// Metric rendered.
        metric: DimensionMetric,
    },
    /// A custom field answer.
    CustomField(CustomFieldId),
}

/// A named, typed report column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    name: String,
    group: ColumnGroup,
    source: ColumnSource,
}

impl ColumnDescriptor {
    /// Header text.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group the column belongs to.
    #[must_use]
    pub const fn group(&self) -> ColumnGroup {
        self.group
    }

    /// Value source.
    #[must_use]
    pub const fn source(&self) -> ColumnSource {
        self.source
    }
}

/// Resolved column groups a schema is composed from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaParts {
    /// Pipeline assessments, in association sequence order.
    pub pipeline_assessments: Vec<Assessment>,
    /// Scoring dimensions of pipeline assessments.
    pub pipeline_dimensions: Vec<ScoringDimension>,
    /// Assessments taken outside the pipeline.
    pub non_pipeline_assessments: Vec<Assessment>,
    /// Scoring dimensions of non-pipeline assessments.
    pub non_pipeline_dimensions: Vec<ScoringDimension>,
    /// Organization custom fields.
    pub custom_fields: Vec<CustomField>,
}

/// Ordered column layout of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSchema {
    columns: Vec<ColumnDescriptor>,
    positions: HashMap<String, usize>,
    parts: SchemaParts,
}

impl ReportSchema {
    /// Composes the column layout from resolved groups.
    ///
    /// Generated column names that would clash are disambiguated with a
    /// numeric suffix on the slug. Custom field names are used verbatim, so
    /// a clash there is reported instead.
    ///
    /// # Errors
    ///
    /// Returns [`ReportDomainError::ColumnCollision`] when a custom field
    /// name matches another column.
    pub fn compose(parts: SchemaParts) -> Result<Self, ReportDomainError> {
        let mut layout = Layout::default();

        for column in FixedColumn::ALL {
            layout.push(
                column.header().to_owned(),
                ColumnGroup::Fixed,
                ColumnSource::Fixed(column),
            );
        }

        for assessment in &parts.pipeline_assessments {
            layout.push_assessment(assessment, ColumnGroup::PipelineAssessment, "");
        }
        for dimension in &parts.pipeline_dimensions {
            layout.push_dimension(dimension, ColumnGroup::PipelineDimension, "");
        }
        for assessment in &parts.non_pipeline_assessments {
            layout.push_assessment(
                assessment,
                ColumnGroup::NonPipelineAssessment,
                NON_PIPELINE_SUFFIX,
            );
        }
        for dimension in &parts.non_pipeline_dimensions {
            layout.push_dimension(
                dimension,
                ColumnGroup::NonPipelineDimension,
                NON_PIPELINE_SUFFIX,
            );
        }

        for field in &parts.custom_fields {
            let name = field.name.trim().to_owned();
            if layout.positions.contains_key(&name) {
                return Err(ReportDomainError::ColumnCollision { column: name });
            }
            layout.push(
                name,
                ColumnGroup::CustomField,
                ColumnSource::CustomField(field.id),
            );
        }

        Ok(Self {
            columns: layout.columns,
            positions: layout.positions,
            parts,
        })
    }

    /// Columns in output order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    /// Number of columns; every row has exactly this many values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always `false`: fixed columns are present in every schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header row.
    #[must_use]
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnDescriptor::name).collect()
    }

    /// Position of a column by header name.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Resolved groups the schema was composed from.
    #[must_use]
    pub const fn parts(&self) -> &SchemaParts {
        &self.parts
    }

    /// Ids of every assessment with a column group, pipeline first.
    #[must_use]
    pub fn assessment_ids(&self) -> Vec<AssessmentId> {
        self.parts
            .pipeline_assessments
            .iter()
            .chain(&self.parts.non_pipeline_assessments)
            .map(|assessment| assessment.id)
            .collect()
    }

    /// Ids of every scoring dimension with a column group, pipeline first.
    #[must_use]
    pub fn dimension_ids(&self) -> Vec<ScoringDimensionId> {
        self.parts
            .pipeline_dimensions
            .iter()
            .chain(&self.parts.non_pipeline_dimensions)
            .map(|dimension| dimension.id)
            .collect()
    }

    /// Ids of every custom field column.
    #[must_use]
    pub fn custom_field_ids(&self) -> Vec<CustomFieldId> {
        self.parts.custom_fields.iter().map(|field| field.id).collect()
    }
}

#[derive(Default)]
struct Layout {
    columns: Vec<ColumnDescriptor>,
    positions: HashMap<String, usize>,
}

impl Layout {
    fn push(&mut self, name: String, group: ColumnGroup, source: ColumnSource) {
        self.positions.insert(name.clone(), self.columns.len());
        self.columns.push(ColumnDescriptor {
            name,
            group,
            source,
        });
    }

    fn push_assessment(&mut self, assessment: &Assessment, group: ColumnGroup, tail: &str) {
        let base = slug_or(&assessment.name, "assessment", assessment.id.into_inner());
        let suffixes = AssessmentMetric::ALL.map(AssessmentMetric::suffix);
        let names = self.free_names(&base, &suffixes, tail);
        for (name, metric) in names.into_iter().zip(AssessmentMetric::ALL) {
            self.push(
                name,
                group,
                ColumnSource::Assessment {
                    assessment_id: assessment.id,
                    metric,
                },
            );
        }
    }

    fn push_dimension(&mut self, dimension: &ScoringDimension, group: ColumnGroup, tail: &str) {
        let base = slug_or(&dimension.name, "dimension", dimension.id.into_inner());
        let suffixes = DimensionMetric::ALL.map(DimensionMetric::suffix);
        let names = self.free_names(&base, &suffixes, tail);
        for (name, metric) in names.into_iter().zip(DimensionMetric::ALL) {
            self.push(
                name,
                group,
                ColumnSource::Dimension {
                    scoring_dimension_id: dimension.id,
                    metric,
                },
            );
        }
    }

    /// Picks the first slug variant whose whole group of names is unused.
    fn free_names(&self, base: &str, suffixes: &[&str], tail: &str) -> Vec<String> {
        let render = |slug: &str| -> Vec<String> {
            suffixes
                .iter()
                .map(|suffix| format!("{slug}_{suffix}{tail}"))
                .collect()
        };
        let is_free = |names: &[String]| {
            let unique: HashSet<&String> = names.iter().collect();
            unique.len() == names.len()
                && names.iter().all(|name| !self.positions.contains_key(name))
        };

        let first = render(base);
        if is_free(&first) {
            return first;
        }
        let mut attempt = 2_u32;
        loop {
            let candidate = render(&format!("{base}_{attempt}"));
            if is_free(&candidate) {
                return candidate;
            }
            attempt += 1;
        }
    }
}

/// Normalizes a display name into a column-safe identifier.
///
/// Leading and trailing whitespace is dropped, the rest is lowercased and
/// each whitespace character becomes an underscore.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(|ch| if ch.is_whitespace() { '_' } else { ch })
        .collect()
}

fn slug_or(name: &str, kind: &str, id: i64) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("{kind}_{id}")
    } else {
        slug
    }
}
