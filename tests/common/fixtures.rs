//! Response bodies shaped like the Web-API's

use corpno_dl::types::RECORD_COLUMNS;

/// One CSV data row with the given sequence number, corporate number and name
pub fn csv_row(sequence: u32, number: &str, name: &str) -> String {
    let mut fields = vec![String::new(); RECORD_COLUMNS.len()];
    fields[0] = sequence.to_string();
    fields[1] = number.to_string();
    fields[2] = "01".to_string();
    fields[3] = "0".to_string();
    fields[4] = "2020-05-07".to_string();
    fields[5] = "2020-05-01".to_string();
    fields[6] = name.to_string();
    fields[8] = "301".to_string();
    fields[9] = "東京都".to_string();
    fields[10] = "千代田区".to_string();
    fields[22] = "2015-10-05".to_string();
    fields[23] = "1".to_string();
    fields.join(",")
}

/// CSV body for one partition: header line followed by `rows`
pub fn csv_body(partition: u32, partition_count: u32, rows: &[String]) -> String {
    let mut body = format!(
        "2020-05-07,{},{},{}\r\n",
        rows.len(),
        partition,
        partition_count
    );
    for row in rows {
        body.push_str(row);
        body.push_str("\r\n");
    }
    body
}

/// Two rows distinguishable by partition
pub fn partition_rows(partition: u32) -> Vec<String> {
    vec![
        csv_row(partition * 10 + 1, "1234567890123", &format!("株式会社第{partition}")),
        csv_row(partition * 10 + 2, "2345678901234", "Example Co., Ltd."),
    ]
}

/// Unindented XML body for one partition
pub fn xml_body(partition: u32, partition_count: u32, names: &[&str]) -> String {
    let mut body = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><corporations><lastUpdateDate>2020-05-07</lastUpdateDate><count>{}</count><divideNumber>{}</divideNumber><divideSize>{}</divideSize>"#,
        names.len(),
        partition,
        partition_count
    );
    for (i, name) in names.iter().enumerate() {
        body.push_str(&format!(
            "<corporation><sequenceNumber>{}</sequenceNumber><corporateNumber>1234567890123</corporateNumber><name>{}</name></corporation>",
            i + 1,
            name
        ));
    }
    body.push_str("</corporations>");
    body
}
