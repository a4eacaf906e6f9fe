/// Arrow schema and batch conversion for the scored grant table.
pub mod grants {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray, UInt8Array};
    use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
    use arrow::error::ArrowError;
    use arrow::record_batch::RecordBatch;
    use chrono::NaiveDate;

    use crate::scoring::ScoredGrantRecord;

    /// Schema for one scored grant row. Derived columns come last.
    pub fn grant_record_schema() -> Schema {
        Schema::new(vec![
            Field::new("opportunity_number", DataType::Utf8, false),
            Field::new("grant_type", DataType::Utf8, false),
            Field::new("status", DataType::Utf8, false),
            Field::new("eligibility", DataType::Utf8, false),
            Field::new("funding", DataType::Int64, true),
            Field::new("award_floor", DataType::Int64, true),
            Field::new("award_ceiling", DataType::Int64, true),
            Field::new("posted_date", DataType::Date32, true),
            Field::new("response_date", DataType::Date32, true),
            Field::new("agency", DataType::Utf8, false),
            Field::new("agency_email", DataType::Utf8, false),
            Field::new("agency_phone", DataType::Utf8, false),
            Field::new("client", DataType::Utf8, false),
            Field::new("email", DataType::Utf8, false),
            Field::new("phone", DataType::Utf8, false),
            Field::new("business", DataType::Utf8, false),
            Field::new("industry", DataType::Utf8, false),
            Field::new("state", DataType::Utf8, false),
            Field::new("country", DataType::Utf8, false),
            Field::new("address", DataType::Utf8, false),
            Field::new("opportunity_score", DataType::UInt8, false),
            Field::new("deadline_status", DataType::Utf8, false),
            Field::new("urgency", DataType::Utf8, false),
            Field::new("progress", DataType::Float64, false),
        ])
    }

    /// Compact column subset used for terminal listings.
    pub const LIST_COLUMNS: &[&str] = &[
        "opportunity_number",
        "grant_type",
        "status",
        "eligibility",
        "funding",
        "response_date",
        "client",
        "state",
        "opportunity_score",
        "deadline_status",
    ];

    /// Build a RecordBatch from scored records, one row each, in input order.
    pub fn scored_batch(rows: &[ScoredGrantRecord<'_>]) -> Result<RecordBatch, ArrowError> {
        let schema: SchemaRef = Arc::new(grant_record_schema());

        let utf8 = |f: fn(&ScoredGrantRecord<'_>) -> String| -> ArrayRef {
            Arc::new(StringArray::from_iter_values(rows.iter().map(f)))
        };
        let int64 = |f: fn(&ScoredGrantRecord<'_>) -> Option<i64>| -> ArrayRef {
            Arc::new(rows.iter().map(f).collect::<Int64Array>())
        };
        let date32 = |f: fn(&ScoredGrantRecord<'_>) -> Option<NaiveDate>| -> ArrayRef {
            Arc::new(
                rows.iter()
                    .map(|r| f(r).map(days_since_epoch))
                    .collect::<Date32Array>(),
            )
        };

        let columns: Vec<ArrayRef> = vec![
            utf8(|r| r.record.opportunity_number.clone()),
            utf8(|r| r.record.grant_type.clone()),
            utf8(|r| r.record.status.to_string()),
            utf8(|r| r.record.eligibility.to_string()),
            int64(|r| r.record.funding),
            int64(|r| r.record.award_floor),
            int64(|r| r.record.award_ceiling),
            date32(|r| r.record.posted_date),
            date32(|r| r.record.response_date),
            utf8(|r| r.record.agency.clone()),
            utf8(|r| r.record.agency_email.clone()),
            utf8(|r| r.record.agency_phone.clone()),
            utf8(|r| r.record.client.clone()),
            utf8(|r| r.record.email.clone()),
            utf8(|r| r.record.phone.clone()),
            utf8(|r| r.record.business.clone()),
            utf8(|r| r.record.industry.clone()),
            utf8(|r| r.record.state.clone()),
            utf8(|r| r.record.country.clone()),
            utf8(|r| r.record.address.clone()),
            Arc::new(UInt8Array::from_iter_values(
                rows.iter().map(|r| r.opportunity_score),
            )),
            utf8(|r| r.deadline.label.clone()),
            utf8(|r| r.deadline.urgency.to_string()),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.progress))),
        ];

        RecordBatch::try_new(schema, columns)
    }

    /// Project a batch down to the named columns, skipping names it lacks.
    pub fn project(batch: &RecordBatch, names: &[&str]) -> Result<RecordBatch, ArrowError> {
        let schema = batch.schema();
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|n| schema.index_of(n).ok())
            .collect();
        batch.project(&indices)
    }

    fn days_since_epoch(date: NaiveDate) -> i32 {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        (date - epoch).num_days() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::grants;
    use crate::record::{Eligibility, GrantRecord, GrantStatus};
    use crate::scoring::score_all;
    use arrow::array::{Array, Date32Array, Int64Array, StringArray, UInt8Array};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn records() -> Vec<GrantRecord> {
        vec![
            GrantRecord {
                opportunity_number: "GRANT-PEL-2026-001".into(),
                grant_type: "Pell Grants".into(),
                status: GrantStatus::Interested,
                eligibility: Eligibility::Yes,
                funding: Some(5_000),
                response_date: NaiveDate::from_ymd_opt(2026, 6, 1),
                ..Default::default()
            },
            GrantRecord {
                opportunity_number: "EXT-9".into(),
                grant_type: "Unlisted".into(),
                status: GrantStatus::parse("Approved"),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn grant_schema_has_expected_fields() {
        let schema = grants::grant_record_schema();
        assert_eq!(schema.fields().len(), 24);
        assert!(schema.field_with_name("opportunity_score").is_ok());
        assert!(schema.field_with_name("response_date").unwrap().is_nullable());
        for name in grants::LIST_COLUMNS {
            assert!(schema.field_with_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn scored_batch_preserves_rows_and_nulls() {
        let recs = records();
        let scored = score_all(&recs, today());
        let batch = grants::scored_batch(&scored).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let status = batch
            .column_by_name("status")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(status.value(1), "Approved");

        let funding = batch
            .column_by_name("funding")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(funding.value(0), 5_000);
        assert!(funding.is_null(1));

        let dates = batch
            .column_by_name("response_date")
            .unwrap()
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value_as_date(0), NaiveDate::from_ymd_opt(2026, 6, 1));
        assert!(dates.is_null(1));

        let scores = batch
            .column_by_name("opportunity_score")
            .unwrap()
            .as_any()
            .downcast_ref::<UInt8Array>()
            .unwrap();
        assert_eq!(scores.value(0), 30 + 20 + 20 + 10);
        assert_eq!(scores.value(1), 0);
    }

    #[test]
    fn project_skips_unknown_columns() {
        let recs = records();
        let batch = grants::scored_batch(&score_all(&recs, today())).unwrap();
        let projected = grants::project(&batch, &["client", "nope", "opportunity_score"]).unwrap();
        assert_eq!(projected.num_columns(), 2);
        assert_eq!(projected.schema().field(0).name(), "client");
    }
}
