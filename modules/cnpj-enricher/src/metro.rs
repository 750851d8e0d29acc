use std::collections::HashMap;

use cnpj_common::{name_key, MetroRegion};

/// Hand-curated membership lists: region, its UF, member municipalities.
/// Names use IBGE spelling; lookups go through `name_key`, so accents and
/// case in the query do not matter.
const REGIONS: &[(MetroRegion, &str, &[&str])] = &[
    (
        MetroRegion::SaoPaulo,
        "SP",
        &[
            "São Paulo",
            "Arujá",
            "Barueri",
            "Biritiba Mirim",
            "Caieiras",
            "Cajamar",
            "Carapicuíba",
            "Cotia",
            "Diadema",
            "Embu das Artes",
            "Embu-Guaçu",
            "Ferraz de Vasconcelos",
            "Francisco Morato",
            "Franco da Rocha",
            "Guararema",
            "Guarulhos",
            "Itapecerica da Serra",
            "Itapevi",
            "Itaquaquecetuba",
            "Jandira",
            "Juquitiba",
            "Mairiporã",
            "Mauá",
            "Mogi das Cruzes",
            "Osasco",
            "Pirapora do Bom Jesus",
            "Poá",
            "Ribeirão Pires",
            "Rio Grande da Serra",
            "Salesópolis",
            "Santa Isabel",
            "Santana de Parnaíba",
            "Santo André",
            "São Bernardo do Campo",
            "São Caetano do Sul",
            "São Lourenço da Serra",
            "Suzano",
            "Taboão da Serra",
            "Vargem Grande Paulista",
        ],
    ),
    (
        MetroRegion::RioDeJaneiro,
        "RJ",
        &[
            "Rio de Janeiro",
            "Belford Roxo",
            "Cachoeiras de Macacu",
            "Duque de Caxias",
            "Guapimirim",
            "Itaboraí",
            "Itaguaí",
            "Japeri",
            "Magé",
            "Maricá",
            "Mesquita",
            "Nilópolis",
            "Niterói",
            "Nova Iguaçu",
            "Paracambi",
            "Petrópolis",
            "Queimados",
            "Rio Bonito",
            "São Gonçalo",
            "São João de Meriti",
            "Seropédica",
            "Tanguá",
        ],
    ),
    (
        MetroRegion::BeloHorizonte,
        "MG",
        &[
            "Belo Horizonte",
            "Betim",
            "Brumadinho",
            "Caeté",
            "Confins",
            "Contagem",
            "Esmeraldas",
            "Ibirité",
            "Igarapé",
            "Lagoa Santa",
            "Mateus Leme",
            "Nova Lima",
            "Pedro Leopoldo",
            "Ribeirão das Neves",
            "Sabará",
            "Santa Luzia",
            "São José da Lapa",
            "Sarzedo",
            "Vespasiano",
        ],
    ),
    (
        MetroRegion::Salvador,
        "BA",
        &[
            "Salvador",
            "Camaçari",
            "Candeias",
            "Dias d'Ávila",
            "Itaparica",
            "Lauro de Freitas",
            "Madre de Deus",
            "Mata de São João",
            "Pojuca",
            "São Francisco do Conde",
            "São Sebastião do Passé",
            "Simões Filho",
            "Vera Cruz",
        ],
    ),
    (
        MetroRegion::Recife,
        "PE",
        &[
            "Recife",
            "Abreu e Lima",
            "Araçoiaba",
            "Cabo de Santo Agostinho",
            "Camaragibe",
            "Goiana",
            "Igarassu",
            "Ilha de Itamaracá",
            "Ipojuca",
            "Itapissuma",
            "Jaboatão dos Guararapes",
            "Moreno",
            "Olinda",
            "Paulista",
            "São Lourenço da Mata",
        ],
    ),
    (
        MetroRegion::ValeDoItajai,
        "SC",
        &[
            "Blumenau",
            "Apiúna",
            "Ascurra",
            "Benedito Novo",
            "Botuverá",
            "Brusque",
            "Doutor Pedrinho",
            "Gaspar",
            "Guabiruba",
            "Indaial",
            "Pomerode",
            "Rio dos Cedros",
            "Rodeio",
            "Timbó",
        ],
    ),
    (
        MetroRegion::PortoAlegre,
        "RS",
        &[
            "Porto Alegre",
            "Alvorada",
            "Cachoeirinha",
            "Campo Bom",
            "Canoas",
            "Eldorado do Sul",
            "Estância Velha",
            "Esteio",
            "Gravataí",
            "Guaíba",
            "Montenegro",
            "Nova Santa Rita",
            "Novo Hamburgo",
            "São Leopoldo",
            "Sapiranga",
            "Sapucaia do Sul",
            "Triunfo",
            "Viamão",
        ],
    ),
    (
        MetroRegion::Curitiba,
        "PR",
        &[
            "Curitiba",
            "Almirante Tamandaré",
            "Araucária",
            "Balsa Nova",
            "Bocaiúva do Sul",
            "Campina Grande do Sul",
            "Campo Largo",
            "Campo Magro",
            "Colombo",
            "Contenda",
            "Fazenda Rio Grande",
            "Itaperuçu",
            "Lapa",
            "Mandirituba",
            "Pinhais",
            "Piraquara",
            "Quatro Barras",
            "Rio Branco do Sul",
            "São José dos Pinhais",
            "Tunas do Paraná",
        ],
    ),
];

/// Static municipality → metropolitan region lookup. Built once, read-only.
pub struct MetroClassifier {
    members: HashMap<String, Vec<(MetroRegion, &'static str)>>,
}

impl MetroClassifier {
    pub fn new() -> Self {
        let mut members: HashMap<String, Vec<(MetroRegion, &'static str)>> = HashMap::new();
        for (region, uf, municipalities) in REGIONS {
            for municipality in municipalities.iter() {
                members
                    .entry(name_key(municipality))
                    .or_default()
                    .push((*region, *uf));
            }
        }
        Self { members }
    }

    /// Region of a municipality by name alone. `None` means "not metropolitan".
    pub fn classify(&self, municipality: &str) -> Option<MetroRegion> {
        self.members
            .get(&name_key(municipality))
            .and_then(|regions| regions.first())
            .map(|(region, _)| *region)
    }

    /// Like `classify`, but only accepts a region whose UF matches `state`.
    /// Municipality names repeat across states (Mesquita exists in RJ and MG).
    pub fn classify_in_state(&self, state: &str, municipality: &str) -> Option<MetroRegion> {
        let uf = state.trim();
        self.members
            .get(&name_key(municipality))?
            .iter()
            .find(|(_, region_uf)| region_uf.eq_ignore_ascii_case(uf))
            .map(|(region, _)| *region)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Default for MetroClassifier {
    fn default() -> Self {
        Self::new()
    }
}
