use aws_lambda_events::kinesis::KinesisEventRecord;

use crate::Error;

/// Joins the decoded payloads of a batch, in delivery order, each followed by
/// a newline. The transport base64 is already stripped by the event decoder.
///
/// Fails on the first payload that is not UTF-8; nothing is returned for the
/// rest of the batch in that case.
pub fn assemble_body(records: &[KinesisEventRecord]) -> Result<String, Error> {
    let capacity = records.iter().map(|r| r.kinesis.data.len() + 1).sum();
    let mut body = String::with_capacity(capacity);

    for (index, record) in records.iter().enumerate() {
        let text = std::str::from_utf8(&record.kinesis.data)
            .map_err(|source| Error::InvalidUtf8 { index, source })?;
        body.push_str(text);
        body.push('\n');
    }

    Ok(body)
}
