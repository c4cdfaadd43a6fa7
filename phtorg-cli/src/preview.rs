use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use phtorg_lib::{
    plan::{RenameTaskRow, SkippedItemRow},
    Plan,
};

fn table<const N: usize>(header: [&str; N], rows: impl Iterator<Item = [String; N]>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    for row in rows {
        table.add_row(row);
    }
    table
}

pub fn render(plan: &Plan) -> String {
    let rename_tasks = table(
        RenameTaskRow::HEADER,
        plan.rename_tasks
            .iter()
            .map(|task| RenameTaskRow::from(task).cells().map(str::to_string)),
    );
    let skipped_items = table(
        SkippedItemRow::HEADER,
        plan.skipped_items
            .iter()
            .map(|item| SkippedItemRow::from(item).cells().map(str::to_string)),
    );
    format!(
        "Rename ({}):\n{rename_tasks}\n\nSkip ({}):\n{skipped_items}\n",
        plan.rename_tasks.len(),
        plan.skipped_items.len(),
    )
}
