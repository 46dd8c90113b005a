use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};

/// Render `rows` under `header`. Columns from `amounts_from` on hold amounts
/// and are right-aligned.
pub(crate) fn render<const N: usize>(
    header: [&str; N],
    rows: impl IntoIterator<Item = [String; N]>,
    amounts_from: usize,
) -> String {
    let mut builder = Builder::default();

    builder.push_record(header.map(str::to_string));

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(amounts_from..), Alignment::right());

    table.to_string()
}
