/// Format an amount with thousands separators and no decimals: 50,000,000
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let whole = format!("{:.0}", val.abs());

    let mut with_commas = String::new();
    for (i, c) in whole.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative && with_commas != "0" {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}
