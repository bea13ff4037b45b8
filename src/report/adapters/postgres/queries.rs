//! SQL text for report lookups.
//!
//! Values are always bound: `$n` placeholders only, id collections as
//! `BIGINT[]` compared with `= ANY(...)`. Numeric and timestamp columns are
//! cast so row models do not depend on the exact source column types.

pub(super) const LIST_JOBS: &str = "\
SELECT j.id::bigint AS id, COALESCE(j.name, '') AS name, \
    j.organization_id::bigint AS organization_id \
FROM e_jobs AS j \
WHERE j.organization_id IS NOT NULL \
AND ($1::bigint IS NULL OR j.organization_id = $1) \
AND (cardinality($2::bigint[]) = 0 OR j.id = ANY($2)) \
AND ($3::timestamp IS NULL OR cardinality($2::bigint[]) > 0 OR EXISTS ( \
    SELECT 1 FROM e_candidacies AS c \
    WHERE c.job_id = j.id AND c.created_at >= $3 AND c.created_at < $4)) \
ORDER BY j.id";

pub(super) const ORGANIZATIONS_OF_JOBS: &str = "\
SELECT DISTINCT organization_id::bigint AS id \
FROM e_jobs \
WHERE id = ANY($1) AND organization_id IS NOT NULL \
ORDER BY 1";

pub(super) const CUSTOM_FIELDS: &str = "\
SELECT id::bigint AS id, COALESCE(name, '') AS name \
FROM e_custom_fields \
WHERE organization_id = $1 \
ORDER BY id";

pub(super) const PIPELINE_ASSESSMENTS: &str = "\
SELECT a.id::bigint AS id, COALESCE(a.name, '') AS name \
FROM e_assessments AS a \
INNER JOIN e_job_assessments AS ja ON ja.assessment_id = a.id \
WHERE ja.job_id = ANY($1) \
ORDER BY ja.sequence, a.id";

pub(super) const CANDIDACIES: &str = "\
SELECT c.id::bigint AS id, c.user_id::bigint AS user_id, c.job_id::bigint AS job_id, \
    c.created_at::timestamp AS created_at, \
    c.status::text AS status, c.failed, \
    c.score::double precision AS score, \
    c.percentile::double precision AS percentile, \
    c.weighted_percentage_score::double precision AS weighted_percentage_score, \
    c.remaining_assessment_count::bigint AS remaining_assessment_count, \
    ps.name AS pipeline_stage, \
    u.email, u.first_name, u.last_name, \
    u.country_code::text AS country_code, u.phone::text AS phone \
FROM e_candidacies AS c \
INNER JOIN e_users AS u ON u.id = c.user_id \
INNER JOIN e_pipeline_stages AS ps \
    ON ps.job_id = c.job_id AND ps.id = c.pipeline_stage_id \
WHERE c.job_id = ANY($1) \
AND ($2::timestamp IS NULL OR (c.created_at >= $2 AND c.created_at < $3)) \
ORDER BY c.created_at, c.id";

pub(super) const ASSESSMENTS_TAKEN: &str = "\
SELECT DISTINCT a.id::bigint AS id, COALESCE(a.name, '') AS name \
FROM e_user_assessments AS ua \
INNER JOIN e_candidacies AS c ON c.user_id = ua.user_id \
INNER JOIN e_assessments AS a ON a.id = ua.assessment_id \
WHERE c.id = ANY($1) \
ORDER BY 1";

pub(super) const DIMENSION_IDS_OF_ASSESSMENTS: &str = "\
SELECT DISTINCT sr.scoring_dimension_id::bigint AS id \
FROM e_steps AS s \
INNER JOIN e_scoring_rules AS sr ON sr.step_id = s.id \
WHERE s.assessment_id = ANY($1) AND sr.scoring_dimension_id IS NOT NULL \
ORDER BY 1";

pub(super) const SCORING_DIMENSIONS: &str = "\
SELECT id::bigint AS id, COALESCE(name, '') AS name \
FROM e_scoring_dimensions \
WHERE id = ANY($1) \
ORDER BY id";

pub(super) const TAG_NAMES: &str = "\
SELECT t.name \
FROM e_tags AS t \
INNER JOIN e_candidacy_tags AS ct ON ct.tag_id = t.id \
WHERE ct.candidacy_id = $1 AND t.name IS NOT NULL \
ORDER BY t.name";

pub(super) const COMPLETED_ASSESSMENT_COUNT: &str = "\
SELECT COUNT(*) AS count \
FROM e_user_assessments \
WHERE user_id = $1 AND completed_at IS NOT NULL";

pub(super) const MESSAGE_ACTIVITY: &str = "\
SELECT e.type::text AS channel, COUNT(*) AS event_count, \
    (ARRAY_AGG(e.created_at::timestamp ORDER BY e.id))[1] AS first_created_at \
FROM e_events AS e \
WHERE e.candidacy_id = $1 AND e.type::text = ANY($2) \
GROUP BY e.type";

pub(super) const FIRST_CALENDAR_EVENT: &str = "\
SELECT MIN(start_datetime::timestamp) AS first_start \
FROM e_calendar_events \
WHERE candidacy_id = $1";

pub(super) const ASSESSMENT_RESULTS: &str = "\
SELECT ua.assessment_id::bigint AS assessment_id, \
    ua.percentage_score::double precision AS percentage_score, \
    ua.started_at::timestamp AS started_at, \
    ua.completed_at::timestamp AS completed_at \
FROM e_user_assessments AS ua \
WHERE ua.user_id = $1 AND ua.assessment_id = ANY($2) \
ORDER BY ua.id";

pub(super) const DIMENSION_RATINGS: &str = "\
SELECT scoring_dimension_id::bigint AS scoring_dimension_id, \
    percentage_score::double precision AS percentage_score \
FROM e_scoring_dimension_ratings \
WHERE candidacy_id = $1 AND scoring_dimension_id = ANY($2) \
ORDER BY id";

pub(super) const CUSTOM_FIELD_ANSWERS: &str = "\
SELECT q.custom_field_id::bigint AS custom_field_id, an.value \
FROM e_answers AS an \
INNER JOIN e_questions AS q ON q.id = an.question_id \
WHERE an.candidacy_id = $1 AND q.custom_field_id = ANY($2) AND an.value <> '' \
ORDER BY an.id";
