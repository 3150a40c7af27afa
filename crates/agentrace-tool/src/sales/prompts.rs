//! Prompt templates for the sales tools

pub fn sql_generation(prompt: &str, columns: &[String], table: &str) -> String {
    format!(
        "\nGenerate an SQL query based on a prompt. Do not reply with anything besides the SQL query.\n\
         The prompt is:\n{}\n\n\
         The available columns are: {}\n\
         The table name is: {}\n",
        prompt,
        columns.join(", "),
        table
    )
}

pub fn data_analysis(data: &str, question: &str) -> String {
    format!(
        "\nAnalyze the following data: {}\nYour job is to answer the following question: {}\n",
        data, question
    )
}

pub fn chart_config(data: &str, goal: &str) -> String {
    format!(
        "\nGenerate a chart configuration based on this data: {}\nThe goal is to show: {}\n",
        data, goal
    )
}

pub fn chart_code(config: &str) -> String {
    format!(
        "\nWrite python code to create a chart based on the following configuration.\n\
         Only return the code, no other text.\n\
         config: {}\n",
        config
    )
}

/// Remove a Markdown code fence (```lang ... ```) and surrounding whitespace
pub fn strip_code_fence(text: &str, lang: &str) -> String {
    text.replace(&format!("```{}", lang), "")
        .trim_matches(|c: char| c == '`' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_prompt_lists_columns_and_table() {
        let prompt = sql_generation(
            "sales for store 7",
            &["Store_Number".to_string(), "Total_Sale_Value".to_string()],
            "sales",
        );
        assert!(prompt.contains("The prompt is:\nsales for store 7\n"));
        assert!(prompt.contains("The available columns are: Store_Number, Total_Sale_Value"));
        assert!(prompt.contains("The table name is: sales"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(
            strip_code_fence("```sql\nSELECT * FROM sales;\n```", "sql"),
            "SELECT * FROM sales;"
        );
        assert_eq!(strip_code_fence("  SELECT 1 \n", "sql"), "SELECT 1");
        assert_eq!(
            strip_code_fence("```python\nimport matplotlib\n```\n", "python"),
            "import matplotlib"
        );
        assert_eq!(strip_code_fence("```json{\"a\":1}```", "json"), "{\"a\":1}");
    }
}
