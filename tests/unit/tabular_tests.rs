use slack_mcp_server::models::user::User;
use slack_mcp_server::tabular::to_csv;

#[test]
fn users_render_with_header() {
    let users = vec![
        User::new("U1", "alice", "Alice A"),
        User::new("U2", "bob", "Bob, Jr."),
    ];
    let out = to_csv(&users).unwrap();
    assert_eq!(
        out,
        "userID,userName,realName\nU1,alice,Alice A\nU2,bob,\"Bob, Jr.\"\n"
    );
}

#[test]
fn output_reads_back_with_csv_reader() {
    let users = vec![User::new("U1", "alice", "line one\nline \"two\"")];
    let out = to_csv(&users).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), vec!["userID", "userName", "realName"]);

    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][2], "line one\nline \"two\"");
}

#[test]
fn no_records_no_output() {
    let users: Vec<User> = Vec::new();
    assert_eq!(to_csv(&users).unwrap(), "");
}
